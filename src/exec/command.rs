// src/exec/command.rs

//! Command descriptions and their conversion into `tokio::process::Command`.

use std::fmt;

use tokio::process::Command;

use crate::errors::RunError;

/// The external program to run.
///
/// - `Argv` is executed directly; the first element is the program.
/// - `Shell` is handed to the platform shell (`sh -c` / `cmd /C`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    Argv(Vec<String>),
    Shell(String),
}

impl CommandSpec {
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Argv(args.into_iter().map(Into::into).collect())
    }

    pub fn shell(line: impl Into<String>) -> Self {
        CommandSpec::Shell(line.into())
    }

    /// Build the `tokio` command, rejecting empty command lines.
    ///
    /// No OS resources are allocated here, so this doubles as the up-front
    /// validation step of a run.
    pub(crate) fn to_command(&self) -> Result<Command, RunError> {
        match self {
            CommandSpec::Argv(argv) => {
                let (program, args) = argv
                    .split_first()
                    .ok_or_else(|| RunError::Config("empty command".to_string()))?;
                if program.is_empty() {
                    return Err(RunError::Config("empty program name".to_string()));
                }
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            CommandSpec::Shell(line) => {
                if line.trim().is_empty() {
                    return Err(RunError::Config("empty shell command".to_string()));
                }
                let cmd = if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                };
                Ok(cmd)
            }
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Shell(line) => f.write_str(line),
            CommandSpec::Argv(argv) => {
                for (i, arg) in argv.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, "{arg:?}")?;
                    } else {
                        f.write_str(arg)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<Vec<String>> for CommandSpec {
    fn from(argv: Vec<String>) -> Self {
        CommandSpec::Argv(argv)
    }
}

impl From<&[&str]> for CommandSpec {
    fn from(argv: &[&str]) -> Self {
        CommandSpec::argv(argv.iter().copied())
    }
}
