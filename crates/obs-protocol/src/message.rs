//! Message types for the OBS WebSocket v5 protocol
//!
//! Every frame on the socket is a JSON text message of the form
//! `{"op": <op code>, "d": <payload>}`. This module defines the payloads and
//! the `Message` enum that ties an op code to its payload type.
//!
//! # Message Flow
//!
//! 1. Client opens the socket, server sends `Hello` (optionally with an
//!    authentication challenge)
//! 2. Client answers with `Identify`
//! 3. Server confirms with `Identified`; the session is now usable
//! 4. Client sends `Request`, server answers each with `RequestResponse`
//!    carrying the same request id
//! 5. Server pushes `Event` messages for subscribed categories at any time

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RPC version this client speaks.
pub const RPC_VERSION: u32 = 1;

/// Op code identifying the payload type of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Server greeting (server → client)
    Hello = 0,
    /// Client identification (client → server)
    Identify = 1,
    /// Identification accepted (server → client)
    Identified = 2,
    /// Update session parameters (client → server)
    Reidentify = 3,
    /// Push event (server → client)
    Event = 5,
    /// Request (client → server)
    Request = 6,
    /// Request response (server → client)
    RequestResponse = 7,
}

impl OpCode {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Hello),
            1 => Some(Self::Identify),
            2 => Some(Self::Identified),
            3 => Some(Self::Reidentify),
            5 => Some(Self::Event),
            6 => Some(Self::Request),
            7 => Some(Self::RequestResponse),
            _ => None,
        }
    }
}

/// WebSocket close codes the server uses to reject a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Identify carried a wrong or missing authentication string
    AuthenticationFailed,
    /// Requested RPC version is not supported
    UnsupportedRpcVersion,
    /// Any other code
    Other(u16),
}

impl CloseCode {
    /// Classify a raw close code
    pub fn from_u16(code: u16) -> Self {
        match code {
            4009 => Self::AuthenticationFailed,
            4010 => Self::UnsupportedRpcVersion,
            other => Self::Other(other),
        }
    }

    /// Raw close code
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::AuthenticationFailed => 4009,
            Self::UnsupportedRpcVersion => 4010,
            Self::Other(code) => *code,
        }
    }
}

/// Event subscription bitmask sent in `Identify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSubscription(pub u32);

impl EventSubscription {
    pub const NONE: Self = Self(0);
    pub const GENERAL: Self = Self(1 << 0);
    pub const CONFIG: Self = Self(1 << 1);
    pub const SCENES: Self = Self(1 << 2);
    pub const INPUTS: Self = Self(1 << 3);
    pub const TRANSITIONS: Self = Self(1 << 4);
    pub const FILTERS: Self = Self(1 << 5);
    pub const OUTPUTS: Self = Self(1 << 6);
    pub const SCENE_ITEMS: Self = Self(1 << 7);
    pub const MEDIA_INPUTS: Self = Self(1 << 8);
    pub const VENDORS: Self = Self(1 << 9);
    pub const UI: Self = Self(1 << 10);

    /// All low-volume categories
    pub const ALL: Self = Self((1 << 11) - 1);

    /// Whether every bit of `other` is set
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for EventSubscription {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Authentication challenge carried in `Hello`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// Server greeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

/// Client identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_subscriptions: Option<EventSubscription>,
}

/// Identification accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

/// Request sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub request_type: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

/// Outcome of a request as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response to a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

/// Push event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub event_type: String,
    #[serde(default)]
    pub event_intent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

/// A protocol message with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Hello(Hello),
    Identify(Identify),
    Identified(Identified),
    Reidentify {
        event_subscriptions: Option<EventSubscription>,
    },
    Event(EventMessage),
    Request(RequestMessage),
    RequestResponse(RequestResponse),
}

impl Message {
    /// Get the op code for this message
    pub fn op_code(&self) -> OpCode {
        match self {
            Message::Hello(_) => OpCode::Hello,
            Message::Identify(_) => OpCode::Identify,
            Message::Identified(_) => OpCode::Identified,
            Message::Reidentify { .. } => OpCode::Reidentify,
            Message::Event(_) => OpCode::Event,
            Message::Request(_) => OpCode::Request,
            Message::RequestResponse(_) => OpCode::RequestResponse,
        }
    }
}
