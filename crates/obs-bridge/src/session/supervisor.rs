//! Session supervisor
//!
//! Owns the single session to the OBS WebSocket server and drives its
//! lifecycle: `Idle -> Connecting -> Open -> Closed`, with `Closed` able to
//! return to `Connecting` on an explicit connect. There is no automatic
//! reconnect.
//!
//! # Scene loading
//!
//! After a successful handshake the first scene-list load is scheduled after
//! a settle delay, since the server may still be finishing identification.
//! A load that fails with "not ready" is retried exactly once. Pending loads
//! are cancelled on disconnect so a stale load cannot repopulate the cache
//! after the session has gone away.
//!
//! # Events
//!
//! An event pump subscribes to the transport once, at construction. Events
//! whose generation does not match the transport's current generation come
//! from a replaced connection and are dropped.
//!
//! # Disconnect during connect
//!
//! Each connect attempt carries a token that `disconnect()` cancels. A
//! cancelled attempt never reaches `Open`; the half-open socket is closed and
//! the attempt reports "Disconnected". A socket that closes between the
//! handshake and the transition to `Open` fails the attempt the same way.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use obs_core::config::{BridgeConfig, ConnectionConfig};
use obs_core::traits::Transport;
use obs_core::{
    BridgeError, ConnectResult, ConnectionStatus, SessionEvent, SessionEventEnvelope, SessionState,
};
use obs_protocol::request::VersionResponse;
use obs_protocol::RequestType;

use super::loader::load_scenes;
use crate::cache::StateCache;
use crate::request::request;

/// Result error of a connect attempt abandoned by `disconnect()`
const DISCONNECTED: &str = "Disconnected";

/// State shared between the supervisor, its event pump and scheduled loads
struct Shared {
    transport: Arc<dyn Transport>,
    cache: Arc<StateCache>,
    state: watch::Sender<SessionState>,
    /// Last surfaced failure: connect error, transport error or failed load
    last_error: watch::Sender<Option<String>>,
    /// Cancelled and replaced on every disconnect
    loads: Mutex<CancellationToken>,
    not_ready_retry_delay: Duration,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("Session state {} -> {}", previous, state);
        }
    }

    fn record_error(&self, error: impl Into<String>) {
        self.last_error.send_replace(Some(error.into()));
    }

    async fn cancel_pending_loads(&self) {
        let mut loads = self.loads.lock().await;
        loads.cancel();
        *loads = CancellationToken::new();
    }

    /// Schedule a scene-list load after `delay`
    async fn schedule_load(self: &Arc<Self>, delay: Duration) {
        let cancel = self.loads.lock().await.clone();
        tokio::spawn(Arc::clone(self).run_scheduled_load(delay, cancel));
    }

    async fn run_scheduled_load(self: Arc<Self>, delay: Duration, cancel: CancellationToken) {
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let err = tokio::select! {
            _ = cancel.cancelled() => return,
            result = load_scenes(self.transport.as_ref(), &self.cache) => match result {
                Ok(()) => return,
                Err(e) => e,
            },
        };

        let not_ready = matches!(&err, BridgeError::Call(call) if call.is_not_ready());
        if !not_ready {
            tracing::error!("Failed to load scenes: {}", err);
            self.record_error(err.to_string());
            return;
        }

        tracing::warn!(
            "OBS not ready, retrying scene load in {:?}",
            self.not_ready_retry_delay
        );

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.not_ready_retry_delay) => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            result = load_scenes(self.transport.as_ref(), &self.cache) => {
                if let Err(e) = result {
                    tracing::error!("Failed to load scenes after retry: {}", e);
                    self.record_error(e.to_string());
                }
            }
        }
    }

    async fn handle_event(self: &Arc<Self>, event: SessionEvent) {
        match event {
            SessionEvent::Opened => {
                // An abandoned attempt may still report its socket opening
                if self.state() == SessionState::Open {
                    self.cache.set_connected(true);
                }
            }
            SessionEvent::Closed => {
                self.mark_closed().await;
            }
            SessionEvent::Error(detail) => {
                tracing::error!("OBS connection error: {}", detail);
                self.record_error(detail);
                self.mark_closed().await;
            }
            SessionEvent::CurrentSceneChanged(name) => {
                tracing::info!("Scene changed to: {}", name);
                self.cache.apply_current_scene(name);
            }
            SessionEvent::SceneListChanged => {
                if self.state() == SessionState::Open {
                    tracing::debug!("Scene list changed, reloading");
                    self.schedule_load(Duration::ZERO).await;
                }
            }
        }
    }

    async fn mark_closed(&self) {
        // A connect in progress owns the state until it resolves
        if self.state() != SessionState::Open {
            return;
        }
        tracing::info!("Disconnected from OBS WebSocket");
        self.set_state(SessionState::Closed);
        self.cache.set_connected(false);
        self.cancel_pending_loads().await;
    }
}

/// Forward transport events into the cache until shutdown
async fn run_event_pump(
    shared: Arc<Shared>,
    mut events: broadcast::Receiver<SessionEventEnvelope>,
    shutdown: CancellationToken,
) {
    loop {
        let envelope = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = events.recv() => match received {
                Ok(envelope) => envelope,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event feed lagged by {} events, reloading scenes", skipped);
                    if shared.state() == SessionState::Open {
                        shared.schedule_load(Duration::ZERO).await;
                    }
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        if envelope.generation != shared.transport.generation() {
            tracing::trace!(
                "Dropping event from generation {} (current {})",
                envelope.generation,
                shared.transport.generation()
            );
            continue;
        }

        shared.handle_event(envelope.event).await;
    }
}

/// Supervises the session to the OBS WebSocket server
pub struct SessionSupervisor {
    shared: Arc<Shared>,
    settle_delay: Duration,
    /// Serializes connect attempts; disconnect does not take it
    connect_lock: Mutex<()>,
    /// Cancelled by `disconnect()` to abandon an in-flight connect
    attempt: Mutex<CancellationToken>,
    shutdown: CancellationToken,
    pump: JoinHandle<()>,
}

impl SessionSupervisor {
    /// Create a supervisor over `transport`.
    ///
    /// Must be called from within a Tokio runtime; the event pump is spawned
    /// here.
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<StateCache>, config: &BridgeConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (last_error, _) = watch::channel(None);
        let events = transport.subscribe();

        let shared = Arc::new(Shared {
            transport,
            cache,
            state,
            last_error,
            loads: Mutex::new(CancellationToken::new()),
            not_ready_retry_delay: config.not_ready_retry_delay,
        });

        let shutdown = CancellationToken::new();
        let pump = tokio::spawn(run_event_pump(
            Arc::clone(&shared),
            events,
            shutdown.clone(),
        ));

        Self {
            shared,
            settle_delay: config.settle_delay,
            connect_lock: Mutex::new(()),
            attempt: Mutex::new(CancellationToken::new()),
            shutdown,
            pump,
        }
    }

    /// Open a session.
    ///
    /// An open session is disconnected first. Failure is reported in the
    /// result, never raised.
    pub async fn connect(&self, connection: &ConnectionConfig) -> ConnectResult {
        let _guard = self.connect_lock.lock().await;

        tracing::info!(
            "Connecting to OBS at {}:{} (password: {})",
            connection.address,
            connection.port,
            if connection.has_password() { "yes" } else { "no" }
        );

        if self.shared.state() == SessionState::Open || self.shared.transport.is_open() {
            tracing::info!("Already connected, disconnecting first");
            self.disconnect().await;
        }

        let attempt = {
            let mut attempt = self.attempt.lock().await;
            *attempt = CancellationToken::new();
            attempt.clone()
        };
        self.shared.set_state(SessionState::Connecting);

        let url = connection.websocket_url();
        let password = connection.password.as_deref().filter(|p| !p.is_empty());

        let connected = tokio::select! {
            result = self.shared.transport.connect(&url, password) => result,
            _ = attempt.cancelled() => {
                tracing::info!("Connect to {} abandoned by disconnect", url);
                return self.abandon_connect(DISCONNECTED).await;
            }
        };

        let info = match connected {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("Failed to connect to OBS: {}", e);
                self.shared.set_state(SessionState::Closed);
                self.shared.cache.set_connected(false);
                self.shared.record_error(e.to_string());
                return ConnectResult::failed(e.to_string());
            }
        };

        if attempt.is_cancelled() {
            return self.abandon_connect(DISCONNECTED).await;
        }
        // Open before checking the socket, so a close that lands after the
        // check is handled by the event pump
        self.shared.set_state(SessionState::Open);
        if attempt.is_cancelled() {
            return self.abandon_connect(DISCONNECTED).await;
        }
        let transport = &self.shared.transport;
        if !transport.is_open() || transport.generation() != info.generation {
            let error = self
                .shared
                .last_error
                .borrow()
                .clone()
                .unwrap_or_else(|| "Connection closed during handshake".to_string());
            tracing::warn!("OBS closed the session right after the handshake");
            self.shared.record_error(error.clone());
            return self.abandon_connect(&error).await;
        }

        self.shared.cache.set_connected(true);
        self.shared.last_error.send_replace(None);
        tracing::info!(
            "Connected to OBS WebSocket {} (rpc v{})",
            info.obs_web_socket_version,
            info.rpc_version
        );

        self.shared.schedule_load(self.settle_delay).await;

        let version = match request::<VersionResponse>(
            self.shared.transport.as_ref(),
            RequestType::GetVersion,
            None,
        )
        .await
        {
            Ok(version) => {
                tracing::info!("OBS version: {}", version.obs_version);
                Some(version.obs_version)
            }
            Err(e) => {
                tracing::warn!("Could not query OBS version: {}", e);
                None
            }
        };

        ConnectResult::connected(version)
    }

    /// Tear down a connect attempt that must not become the open session
    async fn abandon_connect(&self, error: &str) -> ConnectResult {
        self.shared.cancel_pending_loads().await;
        self.shared.transport.disconnect().await;
        self.shared.set_state(SessionState::Closed);
        self.shared.cache.set_connected(false);
        ConnectResult::failed(error)
    }

    /// Close the session. Idempotent; never fails.
    pub async fn disconnect(&self) {
        self.attempt.lock().await.cancel();
        self.shared.cancel_pending_loads().await;

        let state = self.shared.state();
        let open = matches!(state, SessionState::Open | SessionState::Connecting)
            || self.shared.transport.is_open();
        if !open {
            tracing::debug!("Disconnect requested while {}", state);
            return;
        }

        tracing::info!("Disconnecting from OBS");
        self.shared.transport.disconnect().await;
        self.shared.set_state(SessionState::Closed);
        self.shared.cache.set_connected(false);
    }

    /// Reload the scene list now, surfacing any failure
    pub async fn refresh_scenes(&self) -> Result<(), BridgeError> {
        self.ensure_open()?;
        load_scenes(self.shared.transport.as_ref(), &self.shared.cache).await
    }

    /// Fail with `NotConnected` unless the session is open
    pub fn ensure_open(&self) -> Result<(), BridgeError> {
        if self.shared.state() == SessionState::Open {
            Ok(())
        } else {
            Err(BridgeError::NotConnected)
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Watch lifecycle changes
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.shared.state() == SessionState::Open
    }

    /// Last surfaced failure, if any
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.borrow().clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        if self.is_open() {
            ConnectionStatus {
                connected: true,
                error: None,
            }
        } else {
            ConnectionStatus {
                connected: false,
                error: Some(
                    self.last_error()
                        .unwrap_or_else(|| BridgeError::NotConnected.to_string()),
                ),
            }
        }
    }

    pub fn cache(&self) -> &Arc<StateCache> {
        &self.shared.cache
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.shared.transport
    }
}

impl Drop for SessionSupervisor {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.pump.abort();
        if let Ok(loads) = self.shared.loads.try_lock() {
            loads.cancel();
        }
        if let Ok(attempt) = self.attempt.try_lock() {
            attempt.cancel();
        }
    }
}
