//! The dispatcher: ties scanner, tokenizer, builtins and the execution
//! engine together, and routes results to streams or redirect targets.

use crate::builtin::Registry;
use crate::command::ExecutionResult;
use crate::completer::{self, ShellHelper};
use crate::env::Environment;
use crate::external;
use crate::redirect::{scan_redirections, ParsedCommand, RedirectionDirective};
use crate::tokenizer::tokenize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::fs::OpenOptions;
use std::io::Write;

/// A minimal shell-like interpreter executing builtins and external commands.
///
/// The interpreter owns the [`Environment`] and the builtin [`Registry`].
/// Everything else is created fresh per input line: the parsed redirections,
/// the argument vector and the execution result all live only for the
/// duration of [`Interpreter::interpret_line`].
///
/// Example
/// ```no_run
/// use minish::Interpreter;
/// let mut sh = Interpreter::default();
/// sh.interpret_line("echo hello > greeting.txt");
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Registry,
}

impl Interpreter {
    /// Create an interpreter with a custom builtin registry.
    pub fn new(builtins: Registry) -> Self {
        Self {
            env: Environment::new(),
            builtins,
        }
    }

    /// The shell's view of the environment (tracked cwd, variables).
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Process one raw input line end to end.
    ///
    /// Scans redirections, tokenizes the residual command text, dispatches to
    /// a builtin or an external command, and routes the result per the
    /// directives. Errors never escape: an unterminated quote aborts the line
    /// with a message on the shell's stderr and nothing is executed.
    pub fn interpret_line(&mut self, line: &str) {
        let parsed = scan_redirections(line);
        let args = match tokenize(&parsed.command_text) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("{e}");
                return;
            }
        };
        if args.is_empty() {
            return;
        }
        log::debug!("args {args:?}, stdout {:?}, stderr {:?}", parsed.stdout, parsed.stderr);

        let result = self.execute(&args);
        route(&parsed, &result);
    }

    /// Dispatch an argument vector to a builtin or the execution engine.
    fn execute(&mut self, args: &[String]) -> ExecutionResult {
        let name = &args[0];
        if let Some(handler) = self.builtins.lookup(name) {
            match handler.execute(&args[1..], &mut self.env) {
                Ok(result) => result,
                Err(e) => ExecutionResult::failure(format!("{name}: {e:#}"), 1),
            }
        } else {
            external::run(args, &self.env)
        }
    }

    /// Read-eval loop on a rustyline editor with history and completion.
    ///
    /// Leaves the loop on end-of-file, interrupt, or after a line that set
    /// the exit flag.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ShellHelper::new(completer::known_commands(&self.env))));

        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    self.interpret_line(&line);
                    if self.env.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("error: {err:?}");
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// Interpreter with the standard five builtins registered.
    fn default() -> Self {
        Self::new(Registry::with_defaults())
    }
}

/// Send each stream of the result where its directive says: a redirect
/// target when one is active, the shell's own standard stream otherwise.
fn route(parsed: &ParsedCommand, result: &ExecutionResult) {
    match &parsed.stdout {
        Some(directive) => write_redirected(directive, result.stdout.as_deref()),
        None => {
            if let Some(out) = result.stdout.as_deref() {
                if !out.is_empty() {
                    println!("{out}");
                }
            }
        }
    }
    match &parsed.stderr {
        Some(directive) => write_redirected(directive, result.stderr.as_deref()),
        None => {
            if let Some(err) = result.stderr.as_deref() {
                if !err.is_empty() {
                    eprintln!("{err}");
                }
            }
        }
    }
}

/// Write a stream payload to its redirect target.
///
/// The file is created (or truncated, in non-append mode) even when the
/// payload is absent or empty; content is written only when non-empty, with
/// a newline appended when the content does not already end in one. Failures
/// are reported on the shell's stderr and not retried.
fn write_redirected(directive: &RedirectionDirective, content: Option<&str>) {
    if let Err(e) = try_write(directive, content.unwrap_or("")) {
        eprintln!("cannot write to file: {}: {e}", directive.target);
    }
}

fn try_write(directive: &RedirectionDirective, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(directive.append)
        .truncate(!directive.append)
        .open(&directive.target)?;
    if !content.is_empty() {
        file.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            file.write_all(b"\n")?;
        }
    }
    Ok(())
}
