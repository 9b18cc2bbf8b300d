//! Incremental `text/event-stream` framing.
//!
//! The backend emits `data: {json}` lines terminated by a blank line. The
//! parser accepts arbitrary chunk boundaries, so a frame split across two
//! socket reads still comes out whole.

use serde::Deserialize;

use crate::domain::TrainingMetrics;

/// One classified stream payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Fresh training metrics for `set_training_progress`.
    Metrics(TrainingMetrics),
    /// The backend declared the run finished.
    Completed,
    /// Unrecognized or malformed payload; already logged.
    Ignored,
}

/// Accumulates bytes and yields the `data` payload of each completed event.
#[derive(Debug, Default)]
pub(crate) struct EventStreamParser {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl EventStreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns payloads of every event the chunk completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(payload) = self.take_line(line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    fn take_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            return Some(self.data_lines.drain(..).collect::<Vec<_>>().join("\n"));
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            self.data_lines
                .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
        // Other fields (event, id, retry) carry nothing we use.
        None
    }
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    metrics: Option<TrainingMetrics>,
}

/// Classify one event payload.
///
/// `{"status":"completed"}` ends the run; `{"metrics":{...}}` carries
/// progress. Anything else is dropped: malformed JSON at warn, a
/// well-formed frame with neither field at debug.
pub(crate) fn classify(payload: &str) -> StreamMessage {
    let envelope: StreamEnvelope = match serde_json::from_str(payload) {
        Ok(envelope) => envelope,
        Err(error) => {
            tracing::warn!("Discarding malformed stream payload: {error}");
            return StreamMessage::Ignored;
        }
    };
    if envelope.status.as_deref() == Some("completed") {
        return StreamMessage::Completed;
    }
    if let Some(metrics) = envelope.metrics {
        return StreamMessage::Metrics(metrics);
    }
    tracing::debug!("Stream payload without status or metrics: {payload}");
    StreamMessage::Ignored
}
