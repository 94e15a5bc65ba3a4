//! obs-core: Core abstractions and configuration for obs-remote
//!
//! This crate provides the shared domain types, error taxonomy, configuration
//! structures and the `Transport` trait used by the bridge and the CLI.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{BridgeError, CallError, ConfigError, ConnectError};
pub use types::{
    CachedState, ConnectResult, ConnectionStatus, Scene, SceneApplyResult, SceneItem,
    SessionEvent, SessionEventEnvelope, SessionInfo, SessionState, ToggleOutcome,
};
