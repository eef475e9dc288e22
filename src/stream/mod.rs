//! Long-lived streaming subscriptions.
//!
//! - `client`: the public facade and subscription handle.
//! - `event`: typed events and the SSE frame decoder.
//! - `framer`: byte buffer to SSE record extraction.
//! - `registry`: one live session per subscription id.
//! - `session`: per-connection workers and lifecycle state.

/// Streaming client facade.
pub mod client;
/// Typed subscription events.
pub mod event;
mod framer;
/// Subscription identifiers and the session registry.
pub mod registry;
/// Connection lifecycle state.
pub mod session;

pub use client::{EventClient, EventEndpoint, StreamError, Subscription};
pub use event::Event;
pub use registry::SubscriptionId;
pub use session::SessionState;
