//! Real-time training metrics over server-sent events.
//!
//! The subscriber follows the store's training flag: flag up opens the
//! single stream connection, flag down closes it. A reader thread owns the
//! socket and forwards parsed events over a channel; `sync` drains that
//! channel on the caller's thread so every store mutation happens in one
//! place.

mod sse;

pub use sse::StreamMessage;

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::http_client;
use crate::store::Store;

/// Audit action recorded when the backend reports a finished run.
pub const TRAINING_COMPLETED_ACTION: &str = "GAN Training Completed";
const TRAINING_COMPLETED_DETAILS: &str =
    "Model reached target fidelity and passed privacy checks.";

#[derive(Debug)]
enum StreamEvent {
    Message(StreamMessage),
    Disconnected,
}

/// Watches the training feed while the store says a run is active.
#[derive(Debug)]
pub struct TrainingStreamSubscriber {
    url: String,
    token: Option<String>,
    connection: Option<StreamConnection>,
}

#[derive(Debug)]
struct StreamConnection {
    receiver: Receiver<StreamEvent>,
    stop: Arc<AtomicBool>,
}

impl TrainingStreamSubscriber {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            connection: None,
        }
    }

    /// Bearer token attached when the next connection opens.
    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// True while the single stream connection is open.
    pub fn is_streaming(&self) -> bool {
        self.connection.is_some()
    }

    /// Reconcile connection state with the store's training flag, then
    /// apply any buffered stream events to the store.
    ///
    /// Call this from the driving loop. Completion and transport errors
    /// clear the training flag and close the connection; a later flag flip
    /// opens a fresh one.
    pub fn sync(&mut self, store: &mut Store) {
        let should_stream = store.state().is_training;
        if !should_stream {
            if self.connection.is_some() {
                tracing::info!("Training flag cleared; closing stream");
                self.close();
            }
            return;
        }
        if self.connection.is_none() {
            tracing::info!(url = %self.url, "Opening training stream");
            self.connection = Some(StreamConnection::open(
                self.url.clone(),
                self.token.clone(),
            ));
        }
        let Some(connection) = self.connection.as_ref() else {
            return;
        };
        let mut close_after = false;
        while let Ok(event) = connection.receiver.try_recv() {
            match event {
                StreamEvent::Message(StreamMessage::Metrics(metrics)) => {
                    store.set_training_progress(metrics);
                }
                StreamEvent::Message(StreamMessage::Completed) => {
                    store.add_audit_log(TRAINING_COMPLETED_ACTION, TRAINING_COMPLETED_DETAILS);
                    store.set_training(false);
                    close_after = true;
                    break;
                }
                StreamEvent::Message(StreamMessage::Ignored) => {}
                StreamEvent::Disconnected => {
                    tracing::warn!("Training stream dropped; clearing training flag");
                    store.set_training(false);
                    close_after = true;
                    break;
                }
            }
        }
        if close_after {
            self.close();
        }
    }

    /// Close any open connection. The reader thread notices the stop flag
    /// or its dead channel and exits on its own.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop.store(true, Ordering::Relaxed);
        }
    }
}

impl Drop for TrainingStreamSubscriber {
    fn drop(&mut self) {
        self.close();
    }
}

impl StreamConnection {
    fn open(url: String, token: Option<String>) -> Self {
        let (sender, receiver) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = Arc::clone(&stop);
        std::thread::spawn(move || run_reader(url, token, sender, reader_stop));
        Self { receiver, stop }
    }
}

fn run_reader(
    url: String,
    token: Option<String>,
    sender: Sender<StreamEvent>,
    stop: Arc<AtomicBool>,
) {
    let mut request = http_client::streaming_agent()
        .get(&url)
        .set("Accept", "text/event-stream");
    if let Some(token) = token {
        request = request.set("Authorization", &format!("Bearer {}", token.trim()));
    }
    let response = match request.call() {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!("Training stream connect failed: {error}");
            let _ = sender.send(StreamEvent::Disconnected);
            return;
        }
    };
    let mut reader = response.into_reader();
    let mut parser = sse::EventStreamParser::new();
    let mut chunk = [0u8; 2048];
    loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let read = match reader.read(&mut chunk) {
            Ok(0) => {
                let _ = sender.send(StreamEvent::Disconnected);
                return;
            }
            Ok(read) => read,
            Err(error) => {
                tracing::warn!("Training stream read failed: {error}");
                let _ = sender.send(StreamEvent::Disconnected);
                return;
            }
        };
        for payload in parser.push(&chunk[..read]) {
            let message = sse::classify(&payload);
            if matches!(message, StreamMessage::Ignored) {
                continue;
            }
            let completed = matches!(message, StreamMessage::Completed);
            if sender.send(StreamEvent::Message(message)).is_err() {
                return;
            }
            if completed {
                return;
            }
        }
    }
}
