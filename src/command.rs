use crate::env::Environment;
use anyhow::Result;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code reported when a command name cannot be resolved to an executable.
pub const NOT_FOUND: ExitCode = 127;

/// The outcome of running one command, builtin or external.
///
/// `stdout` and `stderr` being `None` means "nothing to emit" and is distinct
/// from `Some(String::new())`: an empty-but-present payload still
/// creates/truncates a redirect target file, while an absent payload printed
/// to a terminal produces no output at all. The dispatcher owns that routing;
/// producers only fill in what the command actually wrote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Captured standard output, trailing newline already trimmed.
    pub stdout: Option<String>,
    /// Captured standard error, trailing newline already trimmed.
    pub stderr: Option<String>,
    /// Exit status following shell conventions.
    pub exit_code: ExitCode,
}

impl ExecutionResult {
    /// Successful result with no output on either stream.
    pub fn success() -> Self {
        Self::default()
    }

    /// Successful result carrying standard output.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            ..Self::default()
        }
    }

    /// Failed result carrying a message on standard error.
    pub fn failure(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            stdout: None,
            stderr: Some(message.into()),
            exit_code,
        }
    }
}

/// Object-safe capability implemented by every builtin command.
///
/// Handlers are registered once at startup into the [`Registry`] and looked up
/// by name for every input line. They receive their arguments already
/// tokenized (quotes and escapes resolved) and the mutable [`Environment`],
/// which is the only cross-line state a builtin may touch.
///
/// Expected failures (a missing directory for `cd`, an unknown name for
/// `type`) are reported through the returned [`ExecutionResult`]; `Err` is
/// reserved for unexpected conditions and is rendered by the dispatcher as
/// `<name>: <error>` with exit code 1.
///
/// [`Registry`]: crate::builtin::Registry
pub trait BuiltinHandler {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name(&self) -> &'static str;

    /// Execute the command with the given arguments (command name excluded).
    fn execute(&self, args: &[String], env: &mut Environment) -> Result<ExecutionResult>;
}
