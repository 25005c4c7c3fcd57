use std::sync::{Arc, Mutex};

use outproc::{ConsumerError, StreamKind};

/// Shared log of consumer invocations across both streams.
///
/// Every call is appended in the order it happened, so tests can check
/// per-stream contents as well as the interleaving between streams.
#[derive(Debug, Clone, Default)]
pub struct LineRecorder {
    events: Arc<Mutex<Vec<(StreamKind, String)>>>,
}

impl LineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer that records into `stream`.
    pub fn consumer(
        &self,
        stream: StreamKind,
    ) -> impl FnMut(&str) -> Result<(), ConsumerError> + Send + 'static {
        let events = Arc::clone(&self.events);
        move |line: &str| {
            events.lock().unwrap().push((stream, line.to_string()));
            Ok(())
        }
    }

    pub fn out(&self) -> impl FnMut(&str) -> Result<(), ConsumerError> + Send + 'static {
        self.consumer(StreamKind::Stdout)
    }

    pub fn err(&self) -> impl FnMut(&str) -> Result<(), ConsumerError> + Send + 'static {
        self.consumer(StreamKind::Stderr)
    }

    pub fn events(&self) -> Vec<(StreamKind, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn lines(&self, stream: StreamKind) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line.clone())
            .collect()
    }
}
