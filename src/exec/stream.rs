// src/exec/stream.rs

//! Pipe draining and line delivery.

use std::fmt;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::errors::{ConsumerError, RunError};
use crate::exec::TextEncoding;

/// Boxed per-line callback attached to stdout or stderr for one run.
pub type LineConsumer<'a> = Box<dyn FnMut(&str) -> Result<(), ConsumerError> + Send + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Stdin => "stdin",
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        })
    }
}

/// Read a pipe to EOF, splitting on `\n` and stripping the terminator
/// (and a preceding `\r`). A trailing unterminated line is kept.
///
/// A missing pipe yields no lines.
pub(crate) async fn collect_lines<R>(pipe: Option<R>) -> io::Result<Vec<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut segments = BufReader::new(pipe).split(b'\n');
    let mut lines = Vec::new();
    while let Some(mut line) = segments.next_segment().await? {
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Hand every drained line of `stream` to `consumer`, in order.
///
/// Stops at the first decode or consumer failure.
pub(crate) fn deliver<F>(
    stream: StreamKind,
    lines: &[Vec<u8>],
    encoding: TextEncoding,
    consumer: &mut F,
) -> Result<(), RunError>
where
    F: FnMut(&str) -> Result<(), ConsumerError> + ?Sized,
{
    for (idx, raw) in lines.iter().enumerate() {
        let line = idx + 1;
        let text = encoding
            .decode(raw)
            .ok_or(RunError::Decode { stream, line })?;
        consumer(&*text).map_err(|source| RunError::Consumer {
            stream,
            line,
            source,
        })?;
    }
    Ok(())
}
