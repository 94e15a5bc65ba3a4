//! WebSocket transport to the OBS WebSocket server
//!
//! One socket per session. The handshake (Hello, Identify, Identified) runs
//! inline in `connect`; afterwards a handler task owns the socket, correlates
//! responses to pending calls by request id and forwards push events to
//! subscribers. Every event is tagged with the generation of the connection
//! that produced it, so a consumer can drop events from a socket that has
//! already been replaced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use obs_core::traits::Transport;
use obs_core::{CallError, ConnectError, SessionEvent, SessionEventEnvelope, SessionInfo};
use obs_protocol::{
    authentication_string, decode, encode, CloseCode, EventMessage, EventSubscription, Identify,
    Message, RequestMessage, RequestResponse, RequestType, RPC_VERSION,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingTx = oneshot::Sender<Result<Value, CallError>>;

/// Capacity of the event broadcast channel.
///
/// Scene events arrive at human speed; a subscriber that falls this far
/// behind gets `Lagged` and is expected to resync from the server.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the outbound request queue
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// How long `disconnect` waits for the handler to send its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// How often the handler drops pending calls whose caller stopped waiting
const PENDING_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A call waiting to be written to the socket
struct OutboundRequest {
    request: RequestType,
    params: Option<Value>,
    response_tx: PendingTx,
}

/// The socket currently owned by a handler task
struct ActiveSocket {
    generation: u64,
    request_tx: mpsc::Sender<OutboundRequest>,
    cancel: CancellationToken,
    handler: JoinHandle<()>,
}

/// Transport speaking OBS WebSocket v5 over `tokio-tungstenite`
pub struct WebSocketTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
    /// Created once; survives reconnects so subscriptions stay valid
    events: broadcast::Sender<SessionEventEnvelope>,
    /// Generation of the open connection, 0 when none is open
    open_generation: Arc<AtomicU64>,
    /// Last generation handed out
    generation: AtomicU64,
    active: Mutex<Option<ActiveSocket>>,
}

impl WebSocketTransport {
    /// Create a transport with the given handshake and per-call bounds
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            connect_timeout,
            request_timeout,
            events,
            open_generation: Arc::new(AtomicU64::new(0)),
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    fn emit(&self, generation: u64, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(SessionEventEnvelope { generation, event });
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(
        &self,
        url: &str,
        password: Option<&str>,
    ) -> Result<SessionInfo, ConnectError> {
        // A new connect always replaces the previous socket
        self.disconnect().await;

        tracing::debug!(url, authenticated = password.is_some(), "Opening WebSocket");
        let (ws, info) = tokio::time::timeout(self.connect_timeout, handshake(url, password))
            .await
            .map_err(|_| ConnectError::Timeout(self.connect_timeout))??;

        // No await past this point until the socket is registered, so a
        // caller dropping this future mid-handshake leaves nothing running
        let mut active = self.active.lock().await;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        self.open_generation.store(generation, Ordering::SeqCst);
        self.emit(generation, SessionEvent::Opened);

        let handler = tokio::spawn(socket_handler_loop(
            ws,
            request_rx,
            self.events.clone(),
            Arc::clone(&self.open_generation),
            generation,
            cancel.clone(),
        ));

        let replaced = active.replace(ActiveSocket {
            generation,
            request_tx,
            cancel,
            handler,
        });
        drop(active);
        if let Some(replaced) = replaced {
            // Lost a race with a concurrent connect
            replaced.cancel.cancel();
        }

        tracing::info!(
            "WebSocket session open (server {}, rpc v{}, generation {})",
            info.obs_web_socket_version,
            info.rpc_version,
            generation
        );

        Ok(SessionInfo { generation, ..info })
    }

    async fn disconnect(&self) {
        let Some(active) = self.active.lock().await.take() else {
            return;
        };

        tracing::debug!(generation = active.generation, "Closing WebSocket");
        active.cancel.cancel();

        let mut handler = active.handler;
        if tokio::time::timeout(CLOSE_GRACE, &mut handler).await.is_err() {
            tracing::warn!("Socket handler did not stop within {:?}, aborting", CLOSE_GRACE);
            handler.abort();
            let closed_here = self
                .open_generation
                .compare_exchange(active.generation, 0, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
            if closed_here {
                self.emit(active.generation, SessionEvent::Closed);
            }
        }
    }

    async fn call(&self, request: RequestType, params: Option<Value>) -> Result<Value, CallError> {
        if !self.is_open() {
            return Err(CallError::NotConnected);
        }

        // Clone the sender so the lock is not held while waiting for a reply
        let request_tx = match self.active.lock().await.as_ref() {
            Some(active) => active.request_tx.clone(),
            None => return Err(CallError::NotConnected),
        };

        let (response_tx, response_rx) = oneshot::channel();
        request_tx
            .send(OutboundRequest {
                request,
                params,
                response_tx,
            })
            .await
            .map_err(|_| CallError::NotConnected)?;

        match tokio::time::timeout(self.request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CallError::Transport("connection closed".to_string())),
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", request, self.request_timeout);
                Err(CallError::Timeout(request))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEventEnvelope> {
        self.events.subscribe()
    }

    fn is_open(&self) -> bool {
        self.open_generation.load(Ordering::SeqCst) != 0
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Open the socket and run Hello, Identify, Identified
async fn handshake(
    url: &str,
    password: Option<&str>,
) -> Result<(WsStream, SessionInfo), ConnectError> {
    let (mut ws, _) = connect_async(url)
        .await
        .map_err(|e| ConnectError::Transport(format!("Failed to connect to {}: {}", url, e)))?;

    let hello = match next_handshake_message(&mut ws).await? {
        Message::Hello(hello) => hello,
        other => {
            return Err(ConnectError::Handshake(format!(
                "expected Hello, got {:?}",
                other.op_code()
            )))
        }
    };

    let authentication = match (&hello.authentication, password) {
        (Some(challenge), Some(password)) if !password.is_empty() => {
            Some(authentication_string(password, challenge))
        }
        (Some(_), _) => return Err(ConnectError::AuthenticationRequired),
        (None, _) => None,
    };

    let identify = Message::Identify(Identify {
        rpc_version: RPC_VERSION,
        authentication,
        event_subscriptions: Some(EventSubscription::ALL),
    });
    let text = encode(&identify).map_err(|e| ConnectError::Handshake(e.to_string()))?;
    ws.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    let identified = match next_handshake_message(&mut ws).await? {
        Message::Identified(identified) => identified,
        other => {
            return Err(ConnectError::Handshake(format!(
                "expected Identified, got {:?}",
                other.op_code()
            )))
        }
    };

    let info = SessionInfo {
        obs_web_socket_version: hello.obs_web_socket_version,
        rpc_version: identified.negotiated_rpc_version,
        generation: 0,
    };
    Ok((ws, info))
}

/// Read the next protocol message during the handshake
async fn next_handshake_message(ws: &mut WsStream) -> Result<Message, ConnectError> {
    loop {
        match ws.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                return decode(text.as_str()).map_err(|e| ConnectError::Handshake(e.to_string()))
            }
            Some(Ok(WsMessage::Close(frame))) => return Err(handshake_close_error(frame)),
            // Pings are answered by tungstenite
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(ConnectError::Transport(e.to_string())),
            None => {
                return Err(ConnectError::Transport(
                    "connection closed during handshake".to_string(),
                ))
            }
        }
    }
}

fn handshake_close_error(frame: Option<CloseFrame>) -> ConnectError {
    let Some(frame) = frame else {
        return ConnectError::Transport("connection closed during handshake".to_string());
    };

    match CloseCode::from_u16(u16::from(frame.code)) {
        CloseCode::AuthenticationFailed => ConnectError::AuthenticationFailed,
        CloseCode::UnsupportedRpcVersion => {
            ConnectError::Handshake(format!("server does not support rpc v{}", RPC_VERSION))
        }
        CloseCode::Other(code) => ConnectError::Handshake(format!(
            "server closed the connection ({}): {}",
            code,
            frame.reason.as_str()
        )),
    }
}

/// Own the socket until it closes or the session is cancelled
async fn socket_handler_loop(
    ws: WsStream,
    mut request_rx: mpsc::Receiver<OutboundRequest>,
    events: broadcast::Sender<SessionEventEnvelope>,
    open_generation: Arc<AtomicU64>,
    generation: u64,
    cancel: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut pending: HashMap<String, (RequestType, PendingTx)> = HashMap::new();
    let mut failure: Option<String> = None;
    let mut sweep = tokio::time::interval(PENDING_SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_tx.send(WsMessage::Close(None)).await;
                break;
            }
            _ = sweep.tick() => sweep_abandoned(&mut pending),
            outbound = request_rx.recv() => {
                let Some(outbound) = outbound else { break };
                let request_id = Uuid::new_v4().to_string();
                let message = Message::Request(RequestMessage {
                    request_type: outbound.request.as_str().to_string(),
                    request_id: request_id.clone(),
                    request_data: outbound.params,
                });
                let text = match encode(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        let _ = outbound.response_tx.send(Err(CallError::Transport(e.to_string())));
                        continue;
                    }
                };

                tracing::trace!(request = %outbound.request, %request_id, "Sending request");
                pending.insert(request_id, (outbound.request, outbound.response_tx));
                if let Err(e) = ws_tx.send(WsMessage::Text(text.into())).await {
                    failure = Some(e.to_string());
                    break;
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        route_incoming(text.as_str(), &mut pending, &events, generation);
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        if let Some(frame) = frame {
                            if frame.code != WsCloseCode::Normal {
                                failure = Some(format!(
                                    "server closed the connection ({}): {}",
                                    u16::from(frame.code),
                                    frame.reason.as_str()
                                ));
                            }
                        }
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        failure = Some(e.to_string());
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Only clear the flag if a newer connection has not taken over
    let _ = open_generation.compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);

    for (_, (_, response_tx)) in pending.drain() {
        let _ = response_tx.send(Err(CallError::Transport("connection closed".to_string())));
    }

    if let Some(detail) = failure {
        tracing::error!("WebSocket error: {}", detail);
        let _ = events.send(SessionEventEnvelope {
            generation,
            event: SessionEvent::Error(detail),
        });
    }

    tracing::info!("WebSocket session closed (generation {})", generation);
    let _ = events.send(SessionEventEnvelope {
        generation,
        event: SessionEvent::Closed,
    });
}

/// Drop pending calls whose caller timed out and went away
fn sweep_abandoned(pending: &mut HashMap<String, (RequestType, PendingTx)>) {
    let before = pending.len();
    pending.retain(|_, (_, response_tx)| !response_tx.is_closed());
    let dropped = before - pending.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} abandoned request(s)", dropped);
    }
}

/// Deliver a response to its waiting call, or forward an event
fn route_incoming(
    text: &str,
    pending: &mut HashMap<String, (RequestType, PendingTx)>,
    events: &broadcast::Sender<SessionEventEnvelope>,
    generation: u64,
) {
    match decode(text) {
        Ok(Message::RequestResponse(response)) => resolve_response(response, pending),
        Ok(Message::Event(event)) => match map_event(&event) {
            Some(event) => {
                let _ = events.send(SessionEventEnvelope { generation, event });
            }
            None => tracing::trace!("Ignoring event {}", event.event_type),
        },
        Ok(other) => tracing::warn!("Unexpected {:?} message after handshake", other.op_code()),
        Err(e) => tracing::warn!("Failed to decode server message: {}", e),
    }
}

fn resolve_response(
    response: RequestResponse,
    pending: &mut HashMap<String, (RequestType, PendingTx)>,
) {
    let Some((request, response_tx)) = pending.remove(&response.request_id) else {
        tracing::debug!(
            "Response for unknown request id {} ({})",
            response.request_id,
            response.request_type
        );
        return;
    };

    let status = response.request_status;
    let result = if status.result {
        Ok(response.response_data.unwrap_or(Value::Null))
    } else {
        let message = status
            .comment
            .unwrap_or_else(|| format!("request failed with code {}", status.code));
        Err(CallError::Remote {
            request,
            code: status.code,
            message,
        })
    };

    // The caller may have timed out and gone away
    let _ = response_tx.send(result);
}

/// Map the push events the bridge cares about
fn map_event(event: &EventMessage) -> Option<SessionEvent> {
    match event.event_type.as_str() {
        "CurrentProgramSceneChanged" => event
            .event_data
            .as_ref()
            .and_then(|data| data.get("sceneName"))
            .and_then(Value::as_str)
            .map(|name| SessionEvent::CurrentSceneChanged(name.to_string())),
        "SceneListChanged" => Some(SessionEvent::SceneListChanged),
        _ => None,
    }
}
