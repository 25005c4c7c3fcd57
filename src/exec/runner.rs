// src/exec/runner.rs

//! Single-command runner with line consumers and an optional timeout.

use std::pin::pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::{ConsumerError, RunError};
use crate::exec::stream::{collect_lines, deliver};
use crate::exec::{CommandSpec, LineConsumer, Redirect, RunOptions, StreamKind};

/// Run an external command, feeding each line of its output to a consumer.
///
/// ```no_run
/// # async fn demo() -> Result<(), outproc::RunError> {
/// use outproc::{CommandSpec, OutProc};
///
/// let mut lines = Vec::new();
/// let status = OutProc::new(CommandSpec::argv(["echo", "true"]))
///     .read_out(|line| {
///         lines.push(line.to_owned());
///         Ok(())
///     })
///     .run()
///     .await?;
/// assert_eq!(status, 0);
/// assert_eq!(lines, ["true"]);
/// # Ok(())
/// # }
/// ```
///
/// Stream handling per stdout/stderr:
/// - consumer attached: a pipe is created and every line is delivered
/// - explicit [`Redirect`] in the options: used verbatim, no pipe
/// - neither: bound to the null device
///
/// Attaching both a consumer and a redirect to one stream is a
/// [`RunError::Config`], raised before anything is opened or spawned.
pub struct OutProc<'a> {
    command: CommandSpec,
    read_out: Option<LineConsumer<'a>>,
    read_err: Option<LineConsumer<'a>>,
    options: RunOptions,
}

impl<'a> OutProc<'a> {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            read_out: None,
            read_err: None,
            options: RunOptions::default(),
        }
    }

    /// Consumer for standard output lines.
    pub fn read_out<F>(mut self, consumer: F) -> Self
    where
        F: FnMut(&str) -> Result<(), ConsumerError> + Send + 'a,
    {
        self.read_out = Some(Box::new(consumer));
        self
    }

    /// Consumer for standard error lines.
    pub fn read_err<F>(mut self, consumer: F) -> Self
    where
        F: FnMut(&str) -> Result<(), ConsumerError> + Send + 'a,
    {
        self.read_err = Some(Box::new(consumer));
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Spawn the command, wait for it, then deliver all stdout lines
    /// followed by all stderr lines.
    ///
    /// Returns the exit status; a non-zero status is not an error. A child
    /// terminated by a signal reports `128 + signal`.
    ///
    /// Pipes are drained into memory while the child runs, so a child that
    /// writes more than a pipe buffer never stalls. Consumers are only
    /// invoked once the child has been reaped and every pipe closed.
    ///
    /// The timeout bounds spawn plus wait. Draining after the child exits
    /// is bounded by EOF, so a background process that inherited a pipe
    /// delays delivery but never turns a finished run into a timeout. On
    /// timeout the child is killed and reaped before the error returns. A
    /// timeout too large for the clock means no deadline.
    pub async fn run(self) -> Result<i32, RunError> {
        let OutProc {
            command,
            mut read_out,
            mut read_err,
            options,
        } = self;

        let mut cmd = command.to_command()?;
        let out_binding =
            StreamBinding::plan(StreamKind::Stdout, read_out.is_some(), options.stdout.as_ref())?;
        let err_binding =
            StreamBinding::plan(StreamKind::Stderr, read_err.is_some(), options.stderr.as_ref())?;

        cmd.stdin(options.stdin.stdio()?)
            .stdout(out_binding.stdio(StreamKind::Stdout)?)
            .stderr(err_binding.stdio(StreamKind::Stderr)?)
            .kill_on_drop(true);
        options.spawn.apply(&mut cmd);

        let command_line = command.to_string();
        let started = Instant::now();
        let deadline = match options.timeout {
            Some(limit) => match started.checked_add(limit) {
                Some(at) => Some((at, limit)),
                None => {
                    debug!(
                        cmd = %command_line,
                        timeout = ?limit,
                        "timeout beyond clock range; running without a deadline"
                    );
                    None
                }
            },
            None => None,
        };

        let spawned = cmd.spawn();
        // Release the parent's copies of any redirect files right away.
        drop(cmd);
        let mut child = spawned.map_err(|source| RunError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        debug!(pid = child.id(), cmd = %command_line, "spawned child process");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let waited = wait_and_collect(&mut child, stdout, stderr, deadline, &command_line).await?;
        let output = match waited {
            Some(output) => output,
            None => {
                let limit = deadline.map(|(_, limit)| limit).unwrap_or_default();
                warn!(
                    pid = child.id(),
                    cmd = %command_line,
                    timeout = ?limit,
                    "process timed out; killing"
                );
                reap(&mut child, &command_line).await;
                return Err(RunError::Timeout {
                    command: command_line,
                    timeout: limit,
                });
            }
        };

        let code = exit_code(output.status);
        debug!(
            cmd = %command_line,
            exit_code = code,
            stdout_lines = output.out.len(),
            stderr_lines = output.err.len(),
            "child process exited"
        );

        if let Some(consumer) = read_out.as_mut() {
            deliver(StreamKind::Stdout, &output.out, options.encoding, consumer.as_mut())?;
        }
        if let Some(consumer) = read_err.as_mut() {
            deliver(StreamKind::Stderr, &output.err, options.encoding, consumer.as_mut())?;
        }

        Ok(code)
    }
}

/// Run a command without consumers, returning its exit status.
pub async fn run(command: &CommandSpec, options: &RunOptions) -> Result<i32, RunError> {
    OutProc::new(command.clone())
        .options(options.clone())
        .run()
        .await
}

/// Resolved binding for one output stream.
enum StreamBinding<'r> {
    Pipe,
    Redirect(&'r Redirect),
    Discard,
}

impl<'r> StreamBinding<'r> {
    fn plan(
        stream: StreamKind,
        has_consumer: bool,
        redirect: Option<&'r Redirect>,
    ) -> Result<Self, RunError> {
        match (has_consumer, redirect) {
            (true, Some(_)) => Err(RunError::Config(format!(
                "both a {stream} consumer and an explicit {stream} destination were provided"
            ))),
            (true, None) => Ok(StreamBinding::Pipe),
            (false, Some(redirect)) => Ok(StreamBinding::Redirect(redirect)),
            (false, None) => Ok(StreamBinding::Discard),
        }
    }

    fn stdio(&self, stream: StreamKind) -> Result<Stdio, RunError> {
        match self {
            StreamBinding::Pipe => Ok(Stdio::piped()),
            StreamBinding::Redirect(redirect) => redirect.stdio(stream),
            StreamBinding::Discard => Ok(Stdio::null()),
        }
    }
}

struct Collected {
    status: ExitStatus,
    out: Vec<Vec<u8>>,
    err: Vec<Vec<u8>>,
}

/// Wait for the child while draining both pipes in the same task.
///
/// Only the wait races the deadline; `None` means it expired first. Once the
/// child has exited, draining continues until both pipes reach EOF.
async fn wait_and_collect(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    deadline: Option<(Instant, Duration)>,
    command_line: &str,
) -> Result<Option<Collected>, RunError> {
    let mut drains = pin!(async { tokio::join!(collect_lines(stdout), collect_lines(stderr)) });
    let mut drained = None;

    let waited = {
        let wait_while_draining = async {
            let mut wait = pin!(child.wait());
            loop {
                tokio::select! {
                    status = &mut wait => break status,
                    lines = &mut drains, if drained.is_none() => drained = Some(lines),
                }
            }
        };
        match deadline {
            Some((at, _)) => tokio::time::timeout_at(at, wait_while_draining).await.ok(),
            None => Some(wait_while_draining.await),
        }
    };
    let Some(status) = waited else {
        return Ok(None);
    };

    let status = status.map_err(|source| RunError::Wait {
        command: command_line.to_string(),
        source,
    })?;
    let (out, err) = match drained {
        Some(lines) => lines,
        None => drains.await,
    };
    let out = out.map_err(|source| RunError::Read {
        stream: StreamKind::Stdout,
        command: command_line.to_string(),
        source,
    })?;
    let err = err.map_err(|source| RunError::Read {
        stream: StreamKind::Stderr,
        command: command_line.to_string(),
        source,
    })?;

    Ok(Some(Collected { status, out, err }))
}

/// Kill and reap a child that overran its deadline.
async fn reap(child: &mut Child, command_line: &str) {
    if let Err(e) = child.kill().await {
        warn!(
            cmd = %command_line,
            error = %e,
            "failed to kill timed-out child process"
        );
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
