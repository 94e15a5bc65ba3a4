//! Transport implementations for the OBS control plane

mod websocket;

pub use websocket::WebSocketTransport;
