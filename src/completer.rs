//! Tab completion of command names for the line editor.

use crate::builtin::BUILTIN_NAMES;
use crate::env::Environment;
use rustyline::completion::Pair;
use rustyline::{Completer, Helper, Highlighter, Hinter, Validator};
use std::collections::BTreeSet;

/// Line-editor helper wired into rustyline; only completion is customized.
#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
pub struct ShellHelper {
    #[rustyline(Completer)]
    completer: CommandCompleter,
}

impl ShellHelper {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            completer: CommandCompleter { commands },
        }
    }
}

/// Prefix-matches the word under the cursor against the known command names.
pub struct CommandCompleter {
    /// Sorted, de-duplicated command names known at startup.
    commands: Vec<String>,
}

impl rustyline::completion::Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];
        let start = head
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let word = &head[start..];

        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(word))
            .map(|name| Pair {
                display: name.clone(),
                replacement: format!("{name} "),
            })
            .collect();
        Ok((start, candidates))
    }
}

/// Every completable command name: the builtins plus each executable regular
/// file found in the search-path directories. Unreadable directories are
/// skipped silently.
pub fn known_commands(env: &Environment) -> Vec<String> {
    let mut names: BTreeSet<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();

    if let Some(search_paths) = env.get_var("PATH") {
        for dir in std::env::split_paths(&search_paths) {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                if metadata.is_file() && is_executable(&metadata) {
                    if let Ok(name) = entry.file_name().into_string() {
                        names.insert(name);
                    }
                }
            }
        }
    }

    names.into_iter().collect()
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}
