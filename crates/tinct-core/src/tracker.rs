//! Outgoing requests that wait for a matching response.
//!
//! ## Learning: oneshot + timeout
//!
//! Each request parks a `oneshot::Sender` in a table keyed by its id. The
//! reader task hands incoming responses to `resolve`, which completes the
//! waiting future. `tokio::time::timeout` bounds the wait, so a response
//! that never comes turns into an error instead of a hang.
//!
//! The table entry is owned by a guard that lives inside the request
//! future. When that future ends for any reason (answered, timed out, or
//! dropped by an aborted caller) the entry goes with it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{Request, Response};
use crate::{CoreError, CoreResult};

type PendingTable = HashMap<String, oneshot::Sender<Response>>;

/// Sends requests and matches responses to them by id.
#[derive(Debug)]
pub struct RequestTracker {
    outgoing: mpsc::Sender<Request>,
    pending: Mutex<PendingTable>,
    timeout: Duration,
}

impl RequestTracker {
    /// Creates a tracker and the queue its requests are written to.
    pub fn new(timeout: Duration) -> (Self, mpsc::Receiver<Request>) {
        let (outgoing, requests) = mpsc::channel(64);
        let tracker = Self {
            outgoing,
            pending: Mutex::new(HashMap::new()),
            timeout,
        };
        (tracker, requests)
    }

    /// Sends a request and waits for its response payload.
    pub async fn request(&self, command: &str, payload: Value) -> CoreResult<Value> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending_table().insert(request_id.clone(), tx);
        let _entry = PendingEntry {
            tracker: self,
            request_id: &request_id,
        };

        let request = Request {
            request_id: request_id.clone(),
            command: command.to_string(),
            payload,
        };
        if self.outgoing.send(request).await.is_err() {
            return Err(CoreError::Closed);
        }
        debug!("Sent {command} ({request_id})");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(CoreError::Closed),
            Err(_) => {
                warn!("{command} ({request_id}) timed out after {:?}", self.timeout);
                Err(CoreError::Timeout {
                    command: command.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    /// Completes the matching request. Returns false for unknown or late ids.
    pub fn resolve(&self, response: Response) -> bool {
        let Some(tx) = self.pending_table().remove(&response.request_id) else {
            debug!("Dropping response to unknown request {}", response.request_id);
            return false;
        };
        tx.send(response).is_ok()
    }

    /// Number of requests still waiting.
    pub fn pending_count(&self) -> usize {
        self.pending_table().len()
    }

    fn pending_table(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a request's table entry when the waiting future goes away.
struct PendingEntry<'a> {
    tracker: &'a RequestTracker,
    request_id: &'a str,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.tracker.pending_table().remove(self.request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Status;
    use serde_json::json;
    use std::sync::Arc;

    fn answer(request: &Request, payload: Value) -> Response {
        Response {
            request_id: request.request_id.clone(),
            command: request.command.clone(),
            status: Status::Success,
            payload: Some(payload),
            error: None,
            error_kind: None,
        }
    }

    #[tokio::test]
    async fn test_response_completes_request() {
        let (tracker, mut requests) = RequestTracker::new(Duration::from_secs(5));
        let tracker = Arc::new(tracker);

        let responder = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let request = requests.recv().await.unwrap();
                assert_eq!(request.command, "readSettings");
                assert!(tracker.resolve(answer(&request, json!({ "editor.fontSize": 14 }))));
            })
        };

        let payload = tracker.request("readSettings", Value::Null).await.unwrap();
        assert_eq!(payload["editor.fontSize"], json!(14));
        responder.await.unwrap();
        assert_eq!(tracker.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_response_times_out() {
        let (tracker, mut requests) = RequestTracker::new(Duration::from_millis(500));

        let result = tracker.request("readActiveTheme", Value::Null).await;
        assert!(matches!(result, Err(CoreError::Timeout { ref command, .. }) if command == "readActiveTheme"));
        assert_eq!(tracker.pending_count(), 0);

        // A late answer is ignored.
        let request = requests.recv().await.unwrap();
        assert!(!tracker.resolve(answer(&request, Value::Null)));
    }

    #[tokio::test]
    async fn test_dropped_caller_clears_entry() {
        let (tracker, mut requests) = RequestTracker::new(Duration::from_secs(60));
        let tracker = Arc::new(tracker);

        let caller = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.request("writeTheme", Value::Null).await })
        };
        let request = requests.recv().await.unwrap();
        assert_eq!(tracker.pending_count(), 1);

        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(tracker.pending_count(), 0);
        assert!(!tracker.resolve(answer(&request, Value::Null)));
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (tracker, requests) = RequestTracker::new(Duration::from_secs(1));
        drop(requests);
        assert!(matches!(
            tracker.request("requestReload", Value::Null).await,
            Err(CoreError::Closed)
        ));
        assert_eq!(tracker.pending_count(), 0);
    }
}
