// src/exec/data_cmd.rs

//! Tabular command output with exit-status interpretation.
//!
//! [`DataCmd`] sits on top of [`OutProc`]: each stdout line is split on
//! whitespace into a row, stderr is kept as text, and a non-zero exit
//! becomes a [`CmdFailed`] error unless errors are ignored.

use tracing::debug;

use crate::errors::{CmdFailed, DataCmdError};
use crate::exec::{CommandSpec, OutProc, RunOptions};

/// Result of a [`DataCmd`] run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOutcome {
    /// Exit 0 with output ignored.
    Done,
    /// Exit 0; one row of whitespace-separated tokens per output line.
    Rows(Vec<Vec<String>>),
    /// Non-zero exit with `ignore_errors` set.
    Failed(i32),
}

#[derive(Debug, Clone)]
pub struct DataCmd {
    command: CommandSpec,
    ignore_output: bool,
    ignore_errors: bool,
    options: RunOptions,
}

impl DataCmd {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            ignore_output: false,
            ignore_errors: false,
            options: RunOptions::default(),
        }
    }

    /// Discard stdout; a successful run yields [`DataOutcome::Done`].
    pub fn ignore_output(mut self, ignore: bool) -> Self {
        self.ignore_output = ignore;
        self
    }

    /// Discard stderr and report a non-zero exit as
    /// [`DataOutcome::Failed`] instead of an error.
    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run(self) -> Result<DataOutcome, DataCmdError> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        let mut proc = OutProc::new(self.command.clone()).options(self.options);
        if !self.ignore_output {
            proc = proc.read_out(|line| {
                rows.push(tokenize(line));
                Ok(())
            });
        }
        if !self.ignore_errors {
            proc = proc.read_err(|line| {
                errors.push(line.to_owned());
                Ok(())
            });
        }
        let exit_code = proc.run().await?;

        if exit_code == 0 {
            return Ok(if self.ignore_output {
                DataOutcome::Done
            } else {
                DataOutcome::Rows(rows)
            });
        }

        if self.ignore_errors {
            debug!(cmd = %self.command, exit_code, "command failed; errors ignored");
            return Ok(DataOutcome::Failed(exit_code));
        }

        let error_text = if errors.is_empty() {
            None
        } else {
            Some(errors.join("\n"))
        };
        let output = if self.ignore_output || rows.is_empty() {
            None
        } else {
            Some(rows)
        };

        Err(CmdFailed {
            command: self.command.to_string(),
            exit_code,
            error_text,
            output,
        }
        .into())
    }
}

fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}
