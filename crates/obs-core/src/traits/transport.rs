//! Transport trait

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{CallError, ConnectError};
use crate::types::{SessionEventEnvelope, SessionInfo};
use obs_protocol::RequestType;

/// Abstraction over the single control-plane connection to OBS.
///
/// A transport owns at most one open socket at a time. Its event feed is
/// created once with the transport and outlives individual connections, so
/// a subscriber registered before the first connect keeps receiving events
/// across reconnects. Every event is tagged with the connection generation
/// that produced it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session, closing any existing one first.
    ///
    /// Fails with `ConnectError::Timeout` when the handshake does not
    /// complete within the transport's connect bound. Emits `Opened` on
    /// success.
    async fn connect(&self, url: &str, password: Option<&str>)
        -> Result<SessionInfo, ConnectError>;

    /// Close the session. No-op when nothing is open; never fails.
    async fn disconnect(&self);

    /// Issue a request and wait for its response data.
    ///
    /// Fails with `CallError::NotConnected` without touching the socket when
    /// no session is open.
    async fn call(&self, request: RequestType, params: Option<Value>) -> Result<Value, CallError>;

    /// Subscribe to lifecycle and state-change events
    fn subscribe(&self) -> broadcast::Receiver<SessionEventEnvelope>;

    /// Whether a session is currently open
    fn is_open(&self) -> bool;

    /// Generation of the most recent successful connect (0 before any)
    fn generation(&self) -> u64;
}
