//! Process-wide notification hub for rejected credentials.
//!
//! Any API call that comes back 401 raises exactly one notification here
//! before surfacing the error. Interested parties register a channel up
//! front; the HTTP layer never reaches into auth state directly.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Mutex, OnceLock};

/// Marker sent to subscribers when the backend rejects the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

fn subscribers() -> &'static Mutex<Vec<Sender<Unauthorized>>> {
    static SUBSCRIBERS: OnceLock<Mutex<Vec<Sender<Unauthorized>>>> = OnceLock::new();
    SUBSCRIBERS.get_or_init(|| Mutex::new(Vec::new()))
}

/// Register for unauthorized notifications. The receiver stays subscribed
/// until it is dropped.
pub fn subscribe() -> Receiver<Unauthorized> {
    let (sender, receiver) = channel();
    if let Ok(mut list) = subscribers().lock() {
        list.push(sender);
    }
    receiver
}

/// Notify every live subscriber of a 401. Dropped receivers are pruned.
pub(crate) fn notify_unauthorized() {
    if let Ok(mut list) = subscribers().lock() {
        list.retain(|sender| sender.send(Unauthorized).is_ok());
    }
}
