//! External command invocation.
//!
//! Commands are always spawned from an argument vector, never through a shell.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Exit status shells use for "command not found".
pub const EXIT_NOT_FOUND: i32 = 127;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program and captures its output.
///
/// A non-zero exit is not an error at this level; callers decide with
/// [`run_checked`] or by inspecting [`CommandOutput::code`].
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError>;
}

/// Runs real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        debug!(program, ?args, "running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => CommandError::NotFound {
                    program: program.to_string(),
                },
                _ => CommandError::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command that must succeed and return its stdout.
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<String, CommandError> {
    let output = runner.run(program, args)?;
    if !output.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Probe whether an optional tool is installed.
///
/// The probed tool may legitimately exit non-zero (for example when run with no
/// arguments), so only a missing executable or the shell's 127 convention
/// counts as absent. Other spawn failures are returned to the caller.
pub fn is_installed(runner: &dyn CommandRunner, program: &str) -> Result<bool, CommandError> {
    match runner.run(program, &[]) {
        Ok(output) => Ok(output.code != Some(EXIT_NOT_FOUND)),
        Err(CommandError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Resolve a program name the way a shell would.
///
/// Names containing a slash are taken as paths; bare names are searched on PATH.
pub fn find(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = Path::new(name);
        return path.is_file().then(|| path.to_path_buf());
    }
    find_in_path(name)
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Canned responses keyed by the full command line.
    #[derive(Default)]
    pub struct FakeRunner {
        responses: HashMap<String, Result<CommandOutput, FakeFailure>>,
        pub calls: RefCell<Vec<String>>,
    }

    #[derive(Clone, Copy)]
    pub enum FakeFailure {
        NotFound,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command_line: &str, code: i32, stdout: &str) -> Self {
            self.responses.insert(
                command_line.to_string(),
                Ok(CommandOutput {
                    code: Some(code),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            );
            self
        }

        pub fn missing(mut self, command_line: &str) -> Self {
            self.responses
                .insert(command_line.to_string(), Err(FakeFailure::NotFound));
            self
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
            let line = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.borrow_mut().push(line.clone());
            match self.responses.get(&line) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(FakeFailure::NotFound)) | None => Err(CommandError::NotFound {
                    program: program.to_string(),
                }),
            }
        }
    }
}
