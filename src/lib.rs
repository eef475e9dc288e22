//! Rust client for the local HTTP API of Valetudo-powered robot vacuums.
//!
//! The crate is organized by transport surface:
//! - `rest`: request/response client for status, map, segment, and control
//!   endpoints under `/api/v2/`.
//! - `stream`: long-lived SSE and WebSocket subscriptions delivering typed
//!   events (state attribute updates, map updates, connection lifecycle).
//! - `model`: JSON payload types shared by both surfaces.
//! - `tls`: certificate pinning hook applied to either transport.
//! - `retry`: bounded retry and timeout utilities for REST calls.

mod endpoint;

/// JSON payload types for robot state, maps, and control requests.
pub mod model;
/// REST client and endpoint table.
pub mod rest;
/// Retry and timeout helpers used by the REST client.
pub mod retry;
/// Streaming subscriptions over SSE and WebSocket.
pub mod stream;
/// Certificate pinning configuration.
pub mod tls;
