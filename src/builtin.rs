//! Commands implemented inside the shell process.
//!
//! Each builtin is one [`BuiltinHandler`] implementation registered into the
//! [`Registry`] at startup and looked up by name per input line. Builtins
//! that take structured arguments parse them with [`argh`]; a usage error
//! becomes a printable result instead of tearing down the REPL.

use crate::command::{BuiltinHandler, ExecutionResult};
use crate::env::Environment;
use crate::external::find_executable;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Names of every command implemented in-process, in registration order.
///
/// `type` and the completer consult this list directly so they need no
/// back-reference to the registry they live in.
pub const BUILTIN_NAMES: &[&str] = &["echo", "type", "pwd", "cd", "exit"];

/// Name-keyed mapping of builtin handlers.
///
/// Registration happens once at startup; the mapping is immutable afterwards.
/// If two handlers ever shared a name the last registration would win.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn BuiltinHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard five builtins.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Echo));
        registry.register(Box::new(Type));
        registry.register(Box::new(Pwd));
        registry.register(Box::new(Cd));
        registry.register(Box::new(Exit));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn BuiltinHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn BuiltinHandler> {
        self.handlers.get(name).map(Box::as_ref)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// Render an argh early exit (usage text or parse error) as a result.
fn usage_result(exit: EarlyExit) -> ExecutionResult {
    let exit_code = if exit.status.is_err() { 1 } else { 0 };
    ExecutionResult {
        stdout: Some(exit.output),
        stderr: None,
        exit_code,
    }
}

/// Parse builtin arguments, mapping an early exit to a printable result.
fn parse_args<T: FromArgs>(name: &str, args: &[String]) -> Result<T, ExecutionResult> {
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    T::from_args(&[name], &argv).map_err(usage_result)
}

/// `echo`: write the arguments back, separated by single spaces.
///
/// The arguments arrive already tokenized, so quoting and escaping have been
/// resolved: runs of plain spaces collapsed into argument splits, quoted and
/// escaped spacing preserved inside arguments. Joining with one space is all
/// that is left to do. No flag parsing — `echo --help` prints `--help`.
pub struct Echo;

impl BuiltinHandler for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn execute(&self, args: &[String], _env: &mut Environment) -> Result<ExecutionResult> {
        Ok(ExecutionResult::with_stdout(args.join(" ")))
    }
}

#[derive(FromArgs)]
/// Report how a command name would be interpreted.
struct TypeArgs {
    #[argh(positional, greedy)]
    /// command names to look up; only the first is reported.
    names: Vec<String>,
}

/// `type`: builtin names first, then the search path.
pub struct Type;

impl BuiltinHandler for Type {
    fn name(&self) -> &'static str {
        "type"
    }

    fn execute(&self, args: &[String], env: &mut Environment) -> Result<ExecutionResult> {
        let parsed: TypeArgs = match parse_args("type", args) {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        let Some(name) = parsed.names.first() else {
            return Ok(ExecutionResult::success());
        };

        if BUILTIN_NAMES.contains(&name.as_str()) {
            return Ok(ExecutionResult::with_stdout(format!(
                "{name} is a shell builtin"
            )));
        }

        let search_paths = env.get_var("PATH").unwrap_or_default();
        match find_executable(OsStr::new(&search_paths), &env.current_dir, Path::new(name)) {
            Some(path) => Ok(ExecutionResult::with_stdout(format!(
                "{name} is {}",
                path.display()
            ))),
            None => Ok(ExecutionResult {
                stdout: Some(format!("{name}: not found")),
                stderr: None,
                exit_code: 1,
            }),
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
struct PwdArgs {}

/// `pwd`: report the tracked working directory.
pub struct Pwd;

impl BuiltinHandler for Pwd {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn execute(&self, args: &[String], env: &mut Environment) -> Result<ExecutionResult> {
        let _parsed: PwdArgs = match parse_args("pwd", args) {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        Ok(ExecutionResult::with_stdout(
            env.current_dir.to_string_lossy().into_owned(),
        ))
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
struct CdArgs {
    #[argh(positional)]
    /// directory to switch to; absolute, relative to the current directory,
    /// or `~`-prefixed.
    target: Option<String>,
}

/// `cd`: mutate the tracked working directory, never the process one.
pub struct Cd;

impl BuiltinHandler for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(&self, args: &[String], env: &mut Environment) -> Result<ExecutionResult> {
        let parsed: CdArgs = match parse_args("cd", args) {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        let Some(target) = parsed.target.filter(|t| !t.is_empty()) else {
            return Ok(ExecutionResult::failure("cd: missing operand", 1));
        };

        let mut path = target;
        if path.starts_with('~') {
            let Some(home) = env.get_var("HOME") else {
                return Ok(ExecutionResult::failure("cd: HOME not set", 1));
            };
            path = path.replacen('~', &home, 1);
        }

        let candidate = if Path::new(&path).is_absolute() {
            PathBuf::from(&path)
        } else {
            env.current_dir.join(&path)
        };

        match fs::canonicalize(&candidate) {
            Ok(dir) if dir.is_dir() => {
                env.current_dir = dir;
                Ok(ExecutionResult::success())
            }
            _ => Ok(ExecutionResult::failure(
                format!("cd: {path}: No such file or directory"),
                1,
            )),
        }
    }
}

#[derive(FromArgs)]
/// Leave the shell.
struct ExitArgs {
    #[argh(positional, greedy)]
    /// exit status; only the literal `0` actually terminates the loop.
    status: Vec<String>,
}

/// `exit`: flag the REPL to stop, but only for the literal argument `0`.
///
/// Any other argument (or none) is a silent no-op. Historical behavior,
/// reproduced as documented.
pub struct Exit;

impl BuiltinHandler for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(&self, args: &[String], env: &mut Environment) -> Result<ExecutionResult> {
        let parsed: ExitArgs = match parse_args("exit", args) {
            Ok(parsed) => parsed,
            Err(result) => return Ok(result),
        };
        if parsed.status.first().map(String::as_str) == Some("0") {
            env.should_exit = true;
        }
        Ok(ExecutionResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn test_env() -> Environment {
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/");
        env
    }

    #[test]
    fn registry_knows_all_five_builtins() {
        let registry = Registry::with_defaults();
        for name in BUILTIN_NAMES {
            assert!(registry.is_builtin(name), "{name} should be registered");
            assert_eq!(registry.lookup(name).map(|h| h.name()), Some(*name));
        }
        assert!(!registry.is_builtin("ls"));
        assert!(registry.lookup("ls").is_none());
    }

    #[test]
    fn echo_joins_arguments_with_single_spaces() {
        let mut env = test_env();
        let result = Echo.execute(&args(&["hello", "world"]), &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("hello world"));
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn echo_preserves_argument_internal_spacing() {
        let mut env = test_env();
        let result = Echo.execute(&args(&["a  b", "c"]), &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("a  b c"));
    }

    #[test]
    fn echo_without_arguments_emits_empty_present_stdout() {
        let mut env = test_env();
        let result = Echo.execute(&[], &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some(""));
    }

    #[test]
    fn echo_does_not_eat_dashed_arguments() {
        let mut env = test_env();
        let result = Echo.execute(&args(&["--help"]), &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("--help"));
    }

    #[test]
    fn type_reports_builtins() {
        let mut env = test_env();
        let result = Type.execute(&args(&["echo"]), &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("echo is a shell builtin"));
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn type_reports_resolved_executables() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("mytool"), b"").expect("touch");
        let mut env = test_env();
        env.set_var("PATH", tmp.path().to_string_lossy().into_owned());

        let result = Type.execute(&args(&["mytool"]), &mut env).unwrap();
        let line = result.stdout.expect("stdout");
        assert_eq!(
            line,
            format!("mytool is {}", tmp.path().join("mytool").display())
        );
    }

    #[test]
    fn type_reports_unknown_names_on_stdout_with_failure_code() {
        let mut env = test_env();
        env.set_var("PATH", "");
        let result = Type.execute(&args(&["no-such-xyz"]), &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("no-such-xyz: not found"));
        assert!(result.stderr.is_none());
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn type_without_operand_is_silent_success() {
        let mut env = test_env();
        let result = Type.execute(&[], &mut env).unwrap();
        assert_eq!(result, ExecutionResult::success());
    }

    #[test]
    fn pwd_reports_tracked_directory() {
        let mut env = test_env();
        env.current_dir = PathBuf::from("/some/tracked/dir");
        let result = Pwd.execute(&[], &mut env).unwrap();
        assert_eq!(result.stdout.as_deref(), Some("/some/tracked/dir"));
    }

    #[test]
    fn cd_absolute_path_updates_tracked_directory_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let before = std::env::current_dir().expect("cwd");
        let mut env = test_env();

        let target = tmp.path().to_string_lossy().into_owned();
        let result = Cd.execute(&args(&[&target]), &mut env).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(env.current_dir, tmp.path().canonicalize().unwrap());
        // The process working directory is untouched.
        assert_eq!(std::env::current_dir().expect("cwd"), before);
    }

    #[test]
    fn cd_relative_path_resolves_against_tracked_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(tmp.path().join("sub")).expect("mkdir");
        let mut env = test_env();
        env.current_dir = tmp.path().to_path_buf();

        let result = Cd.execute(&args(&["sub"]), &mut env).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(env.current_dir, tmp.path().join("sub").canonicalize().unwrap());

        let result = Cd.execute(&args(&[".."]), &mut env).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(env.current_dir, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn cd_tilde_expands_against_home() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut env = test_env();
        env.set_var("HOME", tmp.path().to_string_lossy().into_owned());

        let result = Cd.execute(&args(&["~"]), &mut env).unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(env.current_dir, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn cd_nonexistent_directory_fails() {
        let mut env = test_env();
        let result = Cd.execute(&args(&["/no/such/dir/xyz"]), &mut env).unwrap();
        assert_eq!(result.exit_code, 1);
        assert_eq!(
            result.stderr.as_deref(),
            Some("cd: /no/such/dir/xyz: No such file or directory")
        );
        assert_eq!(env.current_dir, PathBuf::from("/"));
    }

    #[test]
    #[cfg(unix)]
    fn cd_to_a_file_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("plain");
        std::fs::write(&file, b"x").expect("touch");
        let mut env = test_env();

        let result = Cd
            .execute(&args(&[&file.to_string_lossy()]), &mut env)
            .unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn cd_without_operand_fails() {
        let mut env = test_env();
        let result = Cd.execute(&[], &mut env).unwrap();
        assert_eq!(result.stderr.as_deref(), Some("cd: missing operand"));
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn exit_zero_flags_the_loop() {
        let mut env = test_env();
        let result = Exit.execute(&args(&["0"]), &mut env).unwrap();
        assert_eq!(result, ExecutionResult::success());
        assert!(env.should_exit);
    }

    #[test]
    fn exit_with_other_arguments_is_a_no_op() {
        let mut env = test_env();
        for argv in [vec![], args(&["1"]), args(&["0", "extra"])] {
            env.should_exit = false;
            let _ = Exit.execute(&argv, &mut env).unwrap();
            let expected = argv.first().map(String::as_str) == Some("0");
            assert_eq!(env.should_exit, expected, "argv {argv:?}");
        }
    }
}
