//! Resolution and execution of external commands.
//!
//! The resolver probes the search path for a literal command name; the engine
//! spawns the resolved executable and drains its two output pipes on separate
//! threads. Draining concurrently is load-bearing, not a nicety: a child that
//! fills one OS pipe buffer while the parent is blocked reading the other
//! stream deadlocks both processes.

use crate::command::{ExecutionResult, NOT_FOUND};
use crate::env::Environment;
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// Resolve a command name the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - `./`-prefixed path (any relative path on non-Unix): joined against the
///   shell's tracked working directory and returned if it exists.
/// - Relative path with multiple components (e.g. `bin/tool`): likewise.
/// - Single component: each directory of `search_paths` is probed for an
///   entry whose name equals the command exactly; first hit wins.
/// - Empty name: `None`.
pub fn find_executable(search_paths: &OsStr, cwd: &Path, command: &Path) -> Option<PathBuf> {
    if command.as_os_str().is_empty() {
        return None;
    }
    if command.is_absolute() {
        return command.exists().then(|| command.to_path_buf());
    }

    let search_in_cwd = cfg!(not(unix)) || command.starts_with("./");
    if search_in_cwd {
        let candidate = cwd.join(command);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if command.components().count() > 1 {
        let candidate = cwd.join(command);
        return candidate.exists().then_some(candidate);
    }

    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(command);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Run an external command and capture both output streams.
///
/// Never returns an error for an unknown command: that is a normal outcome,
/// reported as exit code 127 with `<name>: command not found` on stderr.
/// Spawn failures (e.g. a resolved path without execute permission) are
/// folded into the result the same way with exit code 1.
pub fn run(argv: &[String], env: &Environment) -> ExecutionResult {
    let name = &argv[0];
    let search_paths = env.get_var("PATH").unwrap_or_default();

    let Some(executable) = find_executable(
        OsStr::new(&search_paths),
        &env.current_dir,
        Path::new(name),
    ) else {
        return ExecutionResult::failure(format!("{name}: command not found"), NOT_FOUND);
    };
    log::debug!("resolved {name} to {}", executable.display());

    match spawn_and_capture(&executable, &argv[1..], env) {
        Ok(result) => result,
        Err(e) => ExecutionResult::failure(format!("{name}: {e:#}"), 1),
    }
}

fn spawn_and_capture(
    executable: &Path,
    args: &[String],
    env: &Environment,
) -> Result<ExecutionResult> {
    let mut child = Command::new(executable)
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn")?;

    let stdout_pipe = child.stdout.take().context("child stdout not piped")?;
    let stderr_pipe = child.stderr.take().context("child stderr not piped")?;

    // One drain thread per pipe, running alongside the child. The threads
    // own disjoint buffers; the parent reads them only after joining both.
    let stdout_reader = thread::spawn(move || drain(stdout_pipe));
    let stderr_reader = thread::spawn(move || drain(stderr_pipe));

    let status = child.wait().context("failed to wait for child")?;
    let stdout = stdout_reader
        .join()
        .map_err(|_| anyhow::anyhow!("stdout reader panicked"))?;
    let stderr = stderr_reader
        .join()
        .map_err(|_| anyhow::anyhow!("stderr reader panicked"))?;

    Ok(ExecutionResult {
        stdout: finalize_stream(stdout),
        stderr: finalize_stream(stderr),
        exit_code: exit_code_of(status),
    })
}

/// Read a pipe to completion, tolerating interrupts and invalid UTF-8.
fn drain(mut pipe: impl Read) -> String {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Trim exactly one trailing newline; an all-empty buffer becomes `None` so
/// the dispatcher can tell "no output" from "empty output".
fn finalize_stream(buffer: String) -> Option<String> {
    if buffer.is_empty() {
        return None;
    }
    let mut buffer = buffer;
    if buffer.ends_with('\n') {
        buffer.pop();
    }
    Some(buffer)
}

fn exit_code_of(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
    -1
}
