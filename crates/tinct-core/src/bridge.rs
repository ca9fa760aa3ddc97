//! Line-delimited JSON transport between a session and its peer.
//!
//! ## Task Layout
//!
//! ```text
//!            ┌────────── reader ──────────┐
//! input ───▶ │ Request  ──▶ session loop  │──▶ Response ─┐
//!            │ Response ──▶ RequestTracker │              │
//!            └────────────────────────────┘              ▼
//!   host requests (RemoteHost) ───────────────────────▶ writer ───▶ output
//!   session events (EventBus)  ───────────────────────▶   ▲
//! ```
//!
//! Host responses are resolved by the reader task, never by the session
//! loop, so a session waiting on the host can still receive its answer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::{EventHandler, Notification, SessionEvent};
use crate::host::{RemoteHost, ThemeHost};
use crate::protocol::{Incoming, Outgoing, Request};
use crate::session::Session;
use crate::tracker::RequestTracker;
use crate::CoreResult;

/// The session's line to a host on the other side of the bridge.
#[derive(Debug)]
pub struct HostLink {
    tracker: Arc<RequestTracker>,
    requests: mpsc::Receiver<Request>,
}

impl HostLink {
    /// Creates a link and the `RemoteHost` that sends through it.
    pub fn new(timeout: Duration) -> (Self, RemoteHost) {
        let (tracker, requests) = RequestTracker::new(timeout);
        let tracker = Arc::new(tracker);
        let host = RemoteHost::new(tracker.clone());
        (Self { tracker, requests }, host)
    }
}

/// Serves one session until the input stream ends.
///
/// The transport starts before `open` is awaited, so opening a session over
/// a remote host can already exchange requests with it.
pub async fn serve<H, R, W, F>(reader: R, writer: W, link: Option<HostLink>, open: F) -> CoreResult<()>
where
    H: ThemeHost,
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    F: Future<Output = CoreResult<Session<H>>>,
{
    let (out_tx, out_rx) = mpsc::channel::<Outgoing>(256);
    let (req_tx, mut req_rx) = mpsc::channel::<Request>(64);
    let writer_task = tokio::spawn(write_loop(writer, out_rx));

    let tracker = link.as_ref().map(|link| link.tracker.clone());
    if let Some(link) = link {
        tokio::spawn(forward_host_requests(link.requests, out_tx.clone()));
    }
    let reader_task = tokio::spawn(read_loop(reader, tracker, req_tx, out_tx.clone()));

    let mut session = match open.await {
        Ok(session) => session,
        Err(err) => {
            warn!("Could not open session: {err}");
            let push = SessionEvent::Notification(Notification::from_error(&err)).to_push();
            let _ = out_tx.send(Outgoing::Push(push)).await;
            reader_task.abort();
            drop(out_tx);
            let _ = writer_task.await;
            return Err(err);
        }
    };
    info!("Session ready");

    let events_task = tokio::spawn(forward_events(EventHandler::new(session.subscribe()), out_tx.clone()));

    while let Some(request) = req_rx.recv().await {
        debug!("Handling {} ({})", request.command, request.request_id);
        let response = session.handle(&request).await;
        if out_tx.send(Outgoing::Response(response)).await.is_err() {
            break;
        }
    }

    drop(session);
    drop(out_tx);
    let _ = events_task.await;
    reader_task.abort();
    match writer_task.await {
        Ok(result) => result,
        Err(err) => {
            warn!("Writer task failed: {err}");
            Ok(())
        }
    }
}

async fn read_loop<R>(
    reader: R,
    tracker: Option<Arc<RequestTracker>>,
    requests: mpsc::Sender<Request>,
    out: mpsc::Sender<Outgoing>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("Input stream failed: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match Incoming::parse(&line) {
            Ok(Incoming::Request(request)) => {
                if requests.send(request).await.is_err() {
                    break;
                }
            }
            Ok(Incoming::Response(response)) => match &tracker {
                Some(tracker) => {
                    tracker.resolve(response);
                }
                None => debug!("Ignoring response {} with no host link", response.request_id),
            },
            Err(err) => {
                warn!("Dropping malformed message: {err}");
                let push = SessionEvent::Notification(Notification::from_error(&err)).to_push();
                let _ = out.send(Outgoing::Push(push)).await;
            }
        }
    }
    debug!("Input closed");
}

async fn write_loop<W>(mut writer: W, mut out: mpsc::Receiver<Outgoing>) -> CoreResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = out.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn forward_host_requests(mut requests: mpsc::Receiver<Request>, out: mpsc::Sender<Outgoing>) {
    while let Some(request) = requests.recv().await {
        if out.send(Outgoing::Request(request)).await.is_err() {
            break;
        }
    }
}

async fn forward_events(mut events: EventHandler, out: mpsc::Sender<Outgoing>) {
    while let Some(event) = events.next().await {
        if out.send(Outgoing::Push(event.to_push())).await.is_err() {
            break;
        }
    }
}
