use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, shell-level view of the process environment.
///
/// The environment contains:
/// - `vars`: a map of environment variables visible to executed commands.
/// - `current_dir`: the working directory the shell tracks for itself.
/// - `should_exit`: a flag the REPL polls to know when to terminate.
///
/// `current_dir` is deliberately independent of the process-wide working
/// directory: `cd` mutates only this field, and external children receive it
/// through `Command::current_dir`. The process itself never changes
/// directory, which keeps the core testable without process-level side
/// effects.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory for command execution and `pwd`.
    pub current_dir: PathBuf,
    /// When set to true, the interactive loop exits after the current line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    ///
    /// Copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`. `should_exit` starts false.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
