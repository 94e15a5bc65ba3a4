//! obs-protocol: Wire protocol for the OBS WebSocket v5 control plane
//!
//! This crate defines the JSON messages exchanged between obs-remote and the
//! OBS WebSocket server, the typed request names and response payloads the
//! bridge relies on, and the handshake authentication computation.

pub mod auth;
pub mod codec;
pub mod error;
pub mod message;
pub mod request;

pub use auth::authentication_string;
pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use message::{
    AuthChallenge, CloseCode, EventMessage, EventSubscription, Hello, Identified, Identify,
    Message, OpCode, RequestMessage, RequestResponse, RequestStatus, RPC_VERSION,
};
pub use request::{RequestType, StatusCode};
