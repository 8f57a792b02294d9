//! A small interactive shell.
//!
//! This crate provides the interpretation and execution engine of a
//! line-oriented shell: a quote/escape tokenizer, a redirection-operator
//! scanner, a registry of in-process builtin commands and an executor that
//! launches external programs while draining both of their output streams
//! concurrently. A rustyline-based read-eval loop with history and command
//! completion sits on top.
//!
//! The main entry point is [`Interpreter`], which processes one raw input
//! line at a time. The public modules expose the individual stages for
//! embedding and testing: [`redirect`] splits a line into command text and
//! redirection directives, [`tokenizer`] turns command text into arguments,
//! and [`command`] defines the result and builtin-handler contracts.

pub mod builtin;
pub mod command;
pub mod completer;
pub mod env;
pub mod external;
mod interpreter;
pub mod redirect;
pub mod tokenizer;

/// Convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
