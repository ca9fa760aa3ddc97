//! # Tinct Draft
//!
//! Holds the user's uncommitted edits.
//!
//! ## Key Concepts
//!
//! - A [`DraftChange`] names one edit: its kind, its key and its new value.
//! - A [`DraftState`] keeps at most one change per `(kind, key)`, in the order
//!   the keys were first edited.
//! - A [`StructuredState`] is the same information grouped into four maps,
//!   the shape persisted on disk and stored in versions.
//!
//! ## Learning: Ownership of Edits
//!
//! `DraftState::apply` takes changes by value. The caller hands them over and
//! the draft decides whether to keep them; no clone is needed when a change
//! is new, and a no-op change is simply dropped.

mod change;
mod state;
mod structured;

pub use change::{ChangeKind, DraftChange, DraftKey};
pub use state::DraftState;
pub use structured::StructuredState;

/// Result type for draft persistence
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors from reading or writing a draft file.
///
/// The in-memory operations never fail.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed draft file: {0}")]
    Json(#[from] serde_json::Error),
}
