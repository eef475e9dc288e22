//! Connection session workers.
//!
//! Each subscription owns exactly one background task driving a single SSE
//! request or WebSocket connection. The task frames and decodes the incoming
//! payload and forwards events to the subscriber channel in arrival order;
//! the subscriber side applies backpressure through the bounded channel.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, warn};

use crate::stream::event::{decode_sse_frame, Event};
use crate::stream::framer::SseFramer;

/// Interval between keep-alive pings on an open WebSocket session.
pub(crate) const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Lifecycle of a connection session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
    /// Terminal: handshake rejected or the transport errored.
    Failed,
}

impl SessionState {
    fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Publishes lifecycle transitions for one session.
///
/// Once a terminal state is reached the lifecycle goes inert: further
/// transitions are no-ops, so late transport callbacks cannot resurrect a
/// finished session.
pub(crate) struct Lifecycle {
    tx: watch::Sender<SessionState>,
}

impl Lifecycle {
    pub fn new() -> (Self, watch::Receiver<SessionState>) {
        let (tx, rx) = watch::channel(SessionState::Idle);
        (Self { tx }, rx)
    }

    /// Moves to `next` unless the session already terminated.
    pub fn advance(&self, next: SessionState) -> bool {
        let mut advanced = false;
        self.tx.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            debug!(event = "session_state", from = ?state, to = ?next);
            *state = next;
            advanced = true;
            true
        });
        advanced
    }
}

/// Drives one SSE connection to completion.
///
/// `go` is released by the registry once any superseded session for the same
/// id has been torn down, so two transports for one id never overlap.
pub(crate) async fn run_sse_session(
    http: reqwest::Client,
    url: reqwest::Url,
    lifecycle: Lifecycle,
    events: mpsc::Sender<Event>,
    go: oneshot::Receiver<()>,
) {
    if go.await.is_err() {
        return;
    }
    lifecycle.advance(SessionState::Connecting);

    let response = match http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) => response,
        Err(error) => {
            warn!(event = "sse_connect_failed", url = %url, %error);
            lifecycle.advance(SessionState::Failed);
            let _ = events.send(Event::Disconnected).await;
            return;
        }
    };

    if response.status() != reqwest::StatusCode::OK {
        warn!(event = "sse_handshake_rejected", url = %url, status = %response.status());
        lifecycle.advance(SessionState::Failed);
        let _ = events.send(Event::Disconnected).await;
        return;
    }

    lifecycle.advance(SessionState::Open);
    if events.send(Event::Connected).await.is_err() {
        lifecycle.advance(SessionState::Closing);
        lifecycle.advance(SessionState::Closed);
        return;
    }

    let mut framer = SseFramer::new();
    let mut body = response.bytes_stream();
    while let Some(next) = body.next().await {
        match next {
            Ok(chunk) => {
                for frame in framer.append(&chunk) {
                    let Some(event) = decode_sse_frame(&frame) else {
                        continue;
                    };
                    if events.send(event).await.is_err() {
                        // Subscriber dropped the stream; stop reading.
                        lifecycle.advance(SessionState::Closing);
                        lifecycle.advance(SessionState::Closed);
                        return;
                    }
                }
            }
            Err(error) => {
                warn!(event = "sse_transport_error", url = %url, %error);
                lifecycle.advance(SessionState::Failed);
                let _ = events.send(Event::CompletedWithError).await;
                return;
            }
        }
    }

    debug!(event = "sse_stream_ended", url = %url);
    lifecycle.advance(SessionState::Closing);
    lifecycle.advance(SessionState::Closed);
}

/// Drives one WebSocket connection to completion, with the keep-alive ping
/// cadence folded into the read loop.
pub(crate) async fn run_ws_session(
    request: Request,
    connector: Option<Connector>,
    keep_alive: Duration,
    lifecycle: Lifecycle,
    events: mpsc::Sender<Event>,
    go: oneshot::Receiver<()>,
) {
    if go.await.is_err() {
        return;
    }
    lifecycle.advance(SessionState::Connecting);

    let (socket, _response) =
        match connect_async_tls_with_config(request, None, false, connector).await {
            Ok(pair) => pair,
            Err(error) => {
                warn!(event = "ws_handshake_failed", %error);
                lifecycle.advance(SessionState::Failed);
                let _ = events.send(Event::Disconnected).await;
                return;
            }
        };

    lifecycle.advance(SessionState::Open);
    if events.send(Event::Connected).await.is_err() {
        lifecycle.advance(SessionState::Closing);
        lifecycle.advance(SessionState::Closed);
        return;
    }

    let (mut sink, mut incoming) = socket.split();
    let mut ping = tokio::time::interval_at(tokio::time::Instant::now() + keep_alive, keep_alive);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ping.tick() => {
                // Ping failures are logged and the cadence keeps going; only
                // the read side decides when the session is over.
                if let Err(error) = sink.send(Message::Ping(Vec::new())).await {
                    warn!(event = "keep_alive_ping_failed", %error);
                }
            }
            next = incoming.next() => match next {
                Some(Ok(message)) => {
                    let event = match message {
                        Message::Text(text) => Some(Event::Text(text)),
                        Message::Binary(data) => Some(Event::Binary(data)),
                        Message::Ping(_) => Some(Event::Ping),
                        Message::Pong(_) => Some(Event::Pong),
                        Message::Close(_) => {
                            lifecycle.advance(SessionState::Closing);
                            let _ = events.send(Event::Disconnected).await;
                            lifecycle.advance(SessionState::Closed);
                            return;
                        }
                        Message::Frame(_) => {
                            warn!(event = "ws_unexpected_raw_frame");
                            None
                        }
                    };
                    if let Some(event) = event {
                        if events.send(event).await.is_err() {
                            lifecycle.advance(SessionState::Closing);
                            lifecycle.advance(SessionState::Closed);
                            return;
                        }
                    }
                }
                Some(Err(error)) => {
                    warn!(event = "ws_transport_error", %error);
                    lifecycle.advance(SessionState::Failed);
                    return;
                }
                None => {
                    lifecycle.advance(SessionState::Closing);
                    lifecycle.advance(SessionState::Closed);
                    return;
                }
            }
        }
    }
}
