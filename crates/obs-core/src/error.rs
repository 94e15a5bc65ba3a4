//! Core error types for obs-remote

use obs_protocol::{RequestType, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures while opening a session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// No successful handshake within the bound
    #[error("Connection timeout after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Server demands authentication but no password was supplied
    #[error("Authentication required but no password was provided")]
    AuthenticationRequired,

    /// Server rejected the authentication string
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Handshake did not follow the expected sequence
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Socket could not be opened or broke during the handshake
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Failures of a single request/response call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Session is not open
    #[error("Not connected to OBS")]
    NotConnected,

    /// The server reported a failure for this request
    #[error("{request} failed ({code}): {message}")]
    Remote {
        request: RequestType,
        code: u16,
        message: String,
    },

    /// No response within the request timeout
    #[error("{0} timed out")]
    Timeout(RequestType),

    /// Socket closed or broke while the call was in flight
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CallError {
    /// Whether the server was reachable but not yet ready to answer.
    ///
    /// Covers the explicit "not ready" status code as well as messages about
    /// the socket not being identified yet.
    pub fn is_not_ready(&self) -> bool {
        match self {
            CallError::Remote { code, message, .. } => {
                if *code == StatusCode::NOT_READY {
                    return true;
                }
                let message = message.to_ascii_lowercase();
                message.contains("not identified") || message.contains("not ready")
            }
            _ => false,
        }
    }
}

/// Failures of a bridge operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Operation issued while the session is not open
    #[error("Not connected to OBS")]
    NotConnected,

    /// Cross-scene lookup found no scene item for the source
    #[error("Source \"{0}\" not found in any scene")]
    SourceNotFound(String),

    /// A remote call failed
    #[error(transparent)]
    Call(CallError),

    /// The server answered with a payload of the wrong shape
    #[error("Unexpected response to {request}: {detail}")]
    UnexpectedResponse {
        request: RequestType,
        detail: String,
    },
}

impl From<CallError> for BridgeError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::NotConnected => BridgeError::NotConnected,
            other => BridgeError::Call(other),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
