//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Unknown op code in the envelope
    #[error("Unknown op code: {0}")]
    UnknownOpCode(u8),

    /// Message was not valid JSON or did not match the expected shape
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}
