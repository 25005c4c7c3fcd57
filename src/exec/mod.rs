// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything here runs external commands through `tokio::process::Command`
//! and keeps every pipe and child handle scoped to a single call.
//!
//! - [`command`] describes what to run ([`CommandSpec`]).
//! - [`options`] holds per-run configuration ([`RunOptions`]).
//! - [`stream`] drains pipes and delivers lines to consumers.
//! - [`runner`] is the main entry point ([`OutProc`] / [`run`]).
//! - [`data_cmd`] interprets exit statuses for tabular commands.
//! - [`fork`] runs isolated work rooted at a directory.
//! - [`cwd`] serializes changes to the process working directory.

pub mod command;
pub mod cwd;
pub mod data_cmd;
pub mod fork;
pub mod options;
pub mod runner;
pub mod stream;

pub use command::CommandSpec;
pub use cwd::with_current_dir;
pub use data_cmd::{DataCmd, DataOutcome};
#[cfg(unix)]
pub use fork::fork_in;
pub use fork::{FORK_WORK_FAILED, spawn_in};
pub use options::{Redirect, RunOptions, SpawnOptions, StdinPolicy, TextEncoding};
pub use runner::{OutProc, run};
pub use stream::{LineConsumer, StreamKind};
