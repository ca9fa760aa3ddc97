//! Session events, delivered to the UI as push messages.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Rust's ownership model makes traditional observer patterns tricky.
//! We use `tokio::sync::broadcast` for a safe, async-friendly event bus.
//! Events are values, not callbacks, and every subscriber gets its own copy.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::protocol::Push;
use crate::versions::VersionMeta;
use crate::CoreError;

/// How loudly a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn from_error(err: &CoreError) -> Self {
        Self {
            message: err.to_string(),
            severity: err.severity(),
        }
    }
}

/// Something the UI should hear about without asking.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The draft changed; carries the number of pending changes
    DraftChanged { pending: usize },
    /// A theme file was written
    ThemeUpdated { file_name: String, preview: bool },
    /// The version store moved
    VersionChanged(VersionMeta),
    /// A message for the user
    Notification(Notification),
}

impl SessionEvent {
    /// Encodes the event as a push message.
    pub fn to_push(&self) -> Push {
        let (command, payload) = match self {
            SessionEvent::DraftChanged { pending } => ("draftChanged", json!({ "pending": pending })),
            SessionEvent::ThemeUpdated { file_name, preview } => (
                "themeUpdated",
                json!({ "fileName": file_name, "preview": preview }),
            ),
            SessionEvent::VersionChanged(meta) => {
                ("versionChanged", serde_json::to_value(meta).unwrap_or(Value::Null))
            }
            SessionEvent::Notification(notification) => (
                "notification",
                serde_json::to_value(notification).unwrap_or(Value::Null),
            ),
        };
        Push {
            command: command.to_string(),
            payload,
        }
    }
}

/// Event bus for broadcasting session events.
///
/// ## Design
///
/// A broadcast channel lets the bridge and tests listen at the same time,
/// and a lagging receiver never blocks the session.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for processing events asynchronously.
pub struct EventHandler {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventHandler {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged by {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns an event if one is already queued.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
