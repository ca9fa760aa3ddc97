//! Single-writer access to the draft.
//!
//! ## Learning: Actors over Locks
//!
//! The draft is owned by one task. Callers send it operations over an
//! `mpsc` channel and wait on a `oneshot` reply. Operations run one at a
//! time in arrival order, so an `apply` and a `remove` coming from two
//! async completions can never interleave halfway.

use tinct_draft::{ChangeKind, DraftChange, DraftState};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{CoreError, CoreResult};

enum DraftOp {
    Apply(Vec<DraftChange>, oneshot::Sender<(usize, DraftState)>),
    Remove(ChangeKind, String, oneshot::Sender<(bool, DraftState)>),
    Discard(oneshot::Sender<DraftState>),
    Snapshot(oneshot::Sender<DraftState>),
}

/// Handle to the task that owns the draft.
///
/// Every mutating call answers with a snapshot of the draft as it was right
/// after that operation.
#[derive(Debug, Clone)]
pub struct DraftQueue {
    sender: mpsc::Sender<DraftOp>,
}

impl std::fmt::Debug for DraftOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DraftOp::Apply(..) => "Apply",
            DraftOp::Remove(..) => "Remove",
            DraftOp::Discard(..) => "Discard",
            DraftOp::Snapshot(..) => "Snapshot",
        };
        f.write_str(name)
    }
}

impl DraftQueue {
    /// Spawns the owning task with an initial draft.
    pub fn spawn(initial: DraftState) -> Self {
        let (sender, mut receiver) = mpsc::channel::<DraftOp>(64);
        tokio::spawn(async move {
            let mut draft = initial;
            while let Some(op) = receiver.recv().await {
                match op {
                    DraftOp::Apply(changes, reply) => {
                        let altered = draft.apply(changes);
                        let _ = reply.send((altered, draft.clone()));
                    }
                    DraftOp::Remove(kind, key, reply) => {
                        let removed = draft.remove(kind, &key);
                        let _ = reply.send((removed, draft.clone()));
                    }
                    DraftOp::Discard(reply) => {
                        draft.discard_all();
                        let _ = reply.send(draft.clone());
                    }
                    DraftOp::Snapshot(reply) => {
                        let _ = reply.send(draft.clone());
                    }
                }
            }
            debug!("Draft queue closed");
        });
        Self { sender }
    }

    async fn call<T>(&self, op: impl FnOnce(oneshot::Sender<T>) -> DraftOp) -> CoreResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(op(tx)).await.map_err(|_| CoreError::Closed)?;
        rx.await.map_err(|_| CoreError::Closed)
    }

    /// Applies changes; returns how many altered the draft.
    pub async fn apply(&self, changes: Vec<DraftChange>) -> CoreResult<(usize, DraftState)> {
        self.call(|reply| DraftOp::Apply(changes, reply)).await
    }

    /// Removes one change; removing a missing key is not an error.
    pub async fn remove(&self, kind: ChangeKind, key: impl Into<String>) -> CoreResult<(bool, DraftState)> {
        let key = key.into();
        self.call(|reply| DraftOp::Remove(kind, key, reply)).await
    }

    pub async fn discard(&self) -> CoreResult<DraftState> {
        self.call(DraftOp::Discard).await
    }

    pub async fn snapshot(&self) -> CoreResult<DraftState> {
        self.call(DraftOp::Snapshot).await
    }
}
