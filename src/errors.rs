// src/errors.rs

//! Crate-wide error types.
//!
//! - [`RunError`] covers a single process run (spawn, wait, timeout,
//!   consumer failures).
//! - [`CmdFailed`] / [`DataCmdError`] are what [`crate::exec::DataCmd`]
//!   reports when it interprets a non-zero exit status.
//! - [`OutprocError`] covers configuration loading for the CLI.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::exec::StreamKind;

/// Error type a line consumer may return to abort delivery.
pub type ConsumerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RunError {
    /// Invalid combination of options; detected before anything is spawned.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("failed to open {} for {stream}: {source}", .path.display())]
    Redirect {
        stream: StreamKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("process timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed reading {stream} of `{command}`: {source}")]
    Read {
        stream: StreamKind,
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{stream} line {line} is not valid UTF-8")]
    Decode { stream: StreamKind, line: usize },

    /// A caller-supplied consumer returned an error. Raised after every pipe
    /// has been closed and the child reaped.
    #[error("{stream} consumer failed on line {line}: {source}")]
    Consumer {
        stream: StreamKind,
        line: usize,
        #[source]
        source: ConsumerError,
    },
}

/// A command that exited non-zero, as judged by [`crate::exec::DataCmd`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Shell command failed ({exit_code}): {command} => [{}]",
    .error_text.as_deref().unwrap_or("")
)]
pub struct CmdFailed {
    pub command: String,
    pub exit_code: i32,
    /// Standard error lines joined with `\n`; `None` when nothing was written.
    pub error_text: Option<String>,
    /// Tokenized output rows, if any were captured. Not part of the message.
    pub output: Option<Vec<Vec<String>>>,
}

#[derive(Error, Debug)]
pub enum DataCmdError {
    #[error(transparent)]
    Failed(#[from] CmdFailed),

    #[error(transparent)]
    Run(#[from] RunError),
}

#[derive(Error, Debug)]
pub enum OutprocError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OutprocError>;
