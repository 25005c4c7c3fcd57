// src/exec/options.rs

//! Per-run configuration: timeout, stream bindings, decoding, and
//! pass-through spawn parameters.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use tokio::process::Command;

use crate::errors::RunError;
use crate::exec::StreamKind;

/// Where the child's standard input comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StdinPolicy {
    /// Bound to the null device; the child sees EOF immediately.
    #[default]
    Closed,
    Inherit,
    File(PathBuf),
}

impl StdinPolicy {
    pub(crate) fn stdio(&self) -> Result<Stdio, RunError> {
        match self {
            StdinPolicy::Closed => Ok(Stdio::null()),
            StdinPolicy::Inherit => Ok(Stdio::inherit()),
            StdinPolicy::File(path) => File::open(path)
                .map(Stdio::from)
                .map_err(|source| RunError::Redirect {
                    stream: StreamKind::Stdin,
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl FromStr for StdinPolicy {
    type Err = String;

    /// `closed`/`null`, `inherit`, or anything else as a file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err("empty stdin policy".to_string()),
            "closed" | "close" | "null" => Ok(StdinPolicy::Closed),
            "inherit" => Ok(StdinPolicy::Inherit),
            _ => Ok(StdinPolicy::File(PathBuf::from(s))),
        }
    }
}

/// Explicit destination for stdout or stderr. Mutually exclusive with a
/// line consumer on the same stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Null,
    Inherit,
    /// Create or truncate.
    File(PathBuf),
    Append(PathBuf),
}

impl Redirect {
    pub(crate) fn stdio(&self, stream: StreamKind) -> Result<Stdio, RunError> {
        let (path, opened) = match self {
            Redirect::Null => return Ok(Stdio::null()),
            Redirect::Inherit => return Ok(Stdio::inherit()),
            Redirect::File(path) => (path, File::create(path)),
            Redirect::Append(path) => (
                path,
                OpenOptions::new().create(true).append(true).open(path),
            ),
        };
        opened.map(Stdio::from).map_err(|source| RunError::Redirect {
            stream,
            path: path.clone(),
            source,
        })
    }
}

/// How pipe bytes become consumer lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// Invalid UTF-8 fails the run with [`RunError::Decode`].
    Utf8,
    /// Invalid sequences become U+FFFD; the line is still delivered.
    #[default]
    Utf8Lossy,
}

impl TextEncoding {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            TextEncoding::Utf8Lossy => Some(String::from_utf8_lossy(bytes)),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf8-lossy" | "utf-8-lossy" | "lossy" => Ok(TextEncoding::Utf8Lossy),
            other => Err(format!(
                "invalid encoding: {other} (expected \"utf8\" or \"utf8-lossy\")"
            )),
        }
    }
}

/// Platform spawn parameters passed through to the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    pub current_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub env_remove: Vec<String>,
    /// Start from an empty environment before applying `env`.
    pub clear_env: bool,
}

impl SpawnOptions {
    pub(crate) fn apply(&self, cmd: &mut Command) {
        if self.clear_env {
            cmd.env_clear();
        }
        for key in &self.env_remove {
            cmd.env_remove(key);
        }
        cmd.envs(&self.env);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
    }
}

/// Options for one call to [`crate::exec::OutProc::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Bound on spawn + wait. `None` waits forever.
    pub timeout: Option<Duration>,
    pub stdin: StdinPolicy,
    pub encoding: TextEncoding,
    pub stdout: Option<Redirect>,
    pub stderr: Option<Redirect>,
    pub spawn: SpawnOptions,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn stdin(mut self, policy: StdinPolicy) -> Self {
        self.stdin = policy;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn stdout(mut self, redirect: Redirect) -> Self {
        self.stdout = Some(redirect);
        self
    }

    pub fn stderr(mut self, redirect: Redirect) -> Self {
        self.stderr = Some(redirect);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spawn.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spawn.env.insert(key.into(), value.into());
        self
    }
}
