//! Streaming client facade and subscription handle.
//!
//! `EventClient` turns a base address plus a logical endpoint into a running
//! connection session and hands back a `Subscription`: a cancellable,
//! single-consumer, ordered sequence of [`Event`]s. Dropping the
//! subscription (or calling [`EventClient::close`]) tears down the transport
//! task and the registry entry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::Connector;

use crate::endpoint;
use crate::stream::event::Event;
use crate::stream::registry::{Registry, SessionEntry, SubscriptionId};
use crate::stream::session::{
    run_sse_session, run_ws_session, Lifecycle, SessionState, KEEP_ALIVE_INTERVAL,
};
use crate::tls::{PinnedCertificate, TlsError};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// SSE streams served by the robot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventEndpoint {
    /// `robot/state/attributes/sse` — state attribute snapshots.
    StateAttributes,
    /// `robot/state/map/sse` — map snapshots.
    MapUpdates,
}

impl EventEndpoint {
    fn path(self) -> &'static str {
        match self {
            EventEndpoint::StateAttributes => endpoint::STATE_ATTRIBUTES_SSE,
            EventEndpoint::MapUpdates => endpoint::MAP_SSE,
        }
    }
}

/// Errors produced while configuring or opening subscriptions.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The base address did not parse as an origin URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// The endpoint could not be turned into a transport request.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// `close` was called for an id with no live session.
    #[error("no active session for id `{0}`")]
    SessionNotFound(SubscriptionId),

    /// A pinned certificate could not be applied.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// The HTTP client for SSE transports could not be built.
    #[error("http client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Client for long-lived event subscriptions.
///
/// One `EventClient` owns one session registry; independent clients never
/// share sessions. Subscribing spawns a background task, so an `EventClient`
/// must be used from within a tokio runtime.
#[derive(Clone)]
pub struct EventClient {
    base_url: Url,
    http: reqwest::Client,
    connector: Option<Connector>,
    keep_alive: Duration,
    channel_capacity: usize,
    registry: Arc<Registry>,
}

impl EventClient {
    /// Creates a client for the given base origin (scheme, host, port).
    pub fn new(base_url: &str) -> Result<Self, StreamError> {
        let base_url =
            Url::parse(base_url).map_err(|error| StreamError::InvalidBaseUrl(error.to_string()))?;
        if !base_url.has_host() {
            return Err(StreamError::InvalidBaseUrl(format!(
                "`{base_url}` has no host"
            )));
        }
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(StreamError::HttpClient)?;
        Ok(Self {
            base_url,
            http,
            connector: None,
            keep_alive: KEEP_ALIVE_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            registry: Arc::new(Registry::new()),
        })
    }

    /// Trusts a pinned certificate on both the SSE and WebSocket transports.
    pub fn with_pinned_certificate(
        mut self,
        pinned: PinnedCertificate,
    ) -> Result<Self, StreamError> {
        let mut builder = reqwest::Client::builder()
            .no_proxy()
            .add_root_certificate(pinned.reqwest_certificate()?);
        if pinned.hostname_check_disabled() {
            builder = builder.danger_accept_invalid_hostnames(true);
        }
        self.http = builder.build().map_err(StreamError::HttpClient)?;
        self.connector = Some(Connector::NativeTls(pinned.tls_connector()?));
        Ok(self)
    }

    /// Overrides the WebSocket keep-alive ping interval (default 10s).
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Overrides how many undelivered events buffer before the transport
    /// read loop is backpressured.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Opens an SSE subscription for `id`, superseding any live session
    /// under the same id.
    pub fn subscribe(
        &self,
        id: impl Into<SubscriptionId>,
        event_endpoint: EventEndpoint,
    ) -> Subscription {
        let url = endpoint::resolve(&self.base_url, event_endpoint.path());
        let http = self.http.clone();
        self.spawn_session(id.into(), move |lifecycle, events, go| {
            run_sse_session(http, url, lifecycle, events, go)
        })
    }

    /// Opens a WebSocket subscription for `id` against an absolute URL with
    /// the given sub-protocol preferences.
    pub fn open_websocket(
        &self,
        id: impl Into<SubscriptionId>,
        url: &str,
        protocols: &[&str],
    ) -> Result<Subscription, StreamError> {
        let request = build_ws_request(url, protocols)?;
        let connector = self.connector.clone();
        let keep_alive = self.keep_alive;
        Ok(self.spawn_session(id.into(), move |lifecycle, events, go| {
            run_ws_session(request, connector, keep_alive, lifecycle, events, go)
        }))
    }

    /// Cancels the session for `id` and removes it from the registry.
    pub fn close(&self, id: &SubscriptionId) -> Result<(), StreamError> {
        self.registry
            .close(id)
            .ok_or_else(|| StreamError::SessionNotFound(id.clone()))
    }

    /// Whether `id` currently has a live session.
    pub fn is_active(&self, id: &SubscriptionId) -> bool {
        self.registry.contains(id)
    }

    /// Number of live sessions across all ids.
    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    fn spawn_session<F, Fut>(&self, id: SubscriptionId, session: F) -> Subscription
    where
        F: FnOnce(Lifecycle, mpsc::Sender<Event>, oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::channel(self.channel_capacity);
        let (lifecycle, state) = Lifecycle::new();
        let (go_tx, go_rx) = oneshot::channel();
        let epoch = self.registry.next_epoch();

        let worker = session(lifecycle, events_tx.clone(), go_rx);
        let registry = Arc::clone(&self.registry);
        let worker_id = id.clone();
        let task = tokio::spawn(async move {
            worker.await;
            registry.remove_if_current(&worker_id, epoch);
        });

        self.registry.install(
            id.clone(),
            SessionEntry {
                epoch,
                task,
                events: events_tx,
                state: state.clone(),
                go: Some(go_tx),
            },
        );

        Subscription {
            id,
            epoch,
            events: events_rx,
            state,
            registry: Arc::clone(&self.registry),
        }
    }
}

fn build_ws_request(url: &str, protocols: &[&str]) -> Result<Request, StreamError> {
    let mut request = url
        .into_client_request()
        .map_err(|error| StreamError::InvalidEndpoint(error.to_string()))?;
    if !protocols.is_empty() {
        let value = protocols
            .join(", ")
            .parse()
            .map_err(|_| StreamError::InvalidEndpoint("invalid sub-protocol name".to_string()))?;
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", value);
    }
    Ok(request)
}

/// A live subscription's receiving end.
///
/// Dropping the subscription cancels the underlying transport and removes
/// the session from the registry, unless a newer session has already taken
/// over the id.
pub struct Subscription {
    id: SubscriptionId,
    epoch: u64,
    events: mpsc::Receiver<Event>,
    state: watch::Receiver<SessionState>,
    registry: Arc<Registry>,
}

impl Subscription {
    /// Receives the next event, in transport arrival order.
    ///
    /// Returns `None` once the session terminated and all buffered events
    /// were consumed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Current lifecycle state of the underlying session.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.close_if_current(&self.id, self.epoch);
    }
}
