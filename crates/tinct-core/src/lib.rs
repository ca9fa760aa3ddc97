//! # Tinct Core
//!
//! The customization session and everything it talks to.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                              │
//! │  ┌──────────────┐  ┌───────────────┐  ┌──────────────────┐   │
//! │  │  DraftQueue  │  │ VersionStore  │  │  Preview         │   │
//! │  │ (one writer) │  │ (meta + snaps)│  │  Debouncer       │   │
//! │  └──────────────┘  └───────────────┘  └──────────────────┘   │
//! │          │                 │                    │             │
//! │          └──── build_theme (resolve + compile) ─┘             │
//! │                            │                                  │
//! │                     ThemeHost (fs / remote)                   │
//! └──────────────────────────────────────────────────────────────┘
//!        ▲ Request / Response                 │ Push (EventBus)
//!        └──────────────── bridge ◀───────────┘
//! ```
//!
//! ## Learning: One Error Type per Layer
//!
//! Each crate defines its own error enum. `CoreError` wraps the lower ones
//! with `#[from]`, so `?` converts automatically, and adds the
//! classification the UI needs (`ErrorKind`, `Severity`).

pub mod bridge;
pub mod config;
pub mod customize;
pub mod draft_queue;
pub mod event;
pub mod host;
mod io;
pub mod preview;
pub mod protocol;
pub mod session;
pub mod tracker;
pub mod versions;

pub use bridge::{serve, HostLink};
pub use config::{Config, ConfigError};
pub use customize::{build_theme, effective_tokens};
pub use draft_queue::DraftQueue;
pub use event::{EventBus, EventHandler, Notification, SessionEvent, Severity};
pub use host::{FsHost, RemoteHost, ThemeEntry, ThemeHost};
pub use preview::Debouncer;
pub use protocol::{Command, Incoming, Outgoing, Push, Request, Response, Status};
pub use session::Session;
pub use tracker::RequestTracker;
pub use versions::{VersionListing, VersionMeta, VersionStore};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tinct_draft::DraftError;
use tinct_theme::ThemeError;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response to {command} after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Host error: {0}")]
    Host(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session is closed")]
    Closed,
}

/// The four failure classes reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Io,
    Timeout,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Validation(_) | CoreError::Json(_) => ErrorKind::Validation,
            CoreError::Theme(ThemeError::Io(_)) | CoreError::Draft(DraftError::Io(_)) => ErrorKind::Io,
            CoreError::Theme(_) | CoreError::Draft(_) => ErrorKind::Validation,
            CoreError::Config(ConfigError::Io(_)) => ErrorKind::Io,
            CoreError::Config(_) => ErrorKind::Validation,
            CoreError::Timeout { .. } => ErrorKind::Timeout,
            CoreError::Io(_) | CoreError::Host(_) | CoreError::Closed => ErrorKind::Io,
        }
    }

    /// How loudly the UI should report this error.
    pub fn severity(&self) -> Severity {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::Validation => Severity::Warning,
            ErrorKind::Io | ErrorKind::Timeout => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert_eq!(CoreError::NotFound("version 9".into()).kind(), ErrorKind::NotFound);
        let invalid = CoreError::from(ThemeError::InvalidName {
            name: "a/b".into(),
            reason: "name contains a path separator or reserved character",
        });
        assert_eq!(invalid.kind(), ErrorKind::Validation);
        assert_eq!(invalid.severity(), Severity::Warning);

        let io = CoreError::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(io.severity(), Severity::Error);

        let timeout = CoreError::Timeout {
            command: "readActiveTheme".into(),
            after: Duration::from_secs(5),
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert!(timeout.to_string().contains("readActiveTheme"));
    }
}
