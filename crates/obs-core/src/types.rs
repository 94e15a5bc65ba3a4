//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scene as listed by the remote engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name, unique within the remote session
    #[serde(rename = "sceneName")]
    pub name: String,
    /// Remote-assigned ordinal, used for display ordering only
    #[serde(rename = "sceneIndex")]
    pub index: i64,
}

impl Scene {
    /// Create a new scene
    pub fn new(name: impl Into<String>, index: i64) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Placement of a source inside one scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    /// Scene holding the item
    pub scene: String,
    /// Source placed by the item
    pub source: String,
    /// Remote item identifier, unique within the scene
    pub item_id: i64,
    /// Whether the item is visible in this scene
    pub enabled: bool,
}

/// Details negotiated during the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// WebSocket server version announced in `Hello`
    pub obs_web_socket_version: String,
    /// RPC version confirmed in `Identified`
    pub rpc_version: u32,
    /// Connection generation of this session
    pub generation: u64,
}

/// Result of a connect attempt.
///
/// Failure is an expected outcome and is reported here rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obs_version: Option<String>,
}

impl ConnectResult {
    /// A successful connect
    pub fn connected(obs_version: Option<String>) -> Self {
        Self {
            connected: true,
            error: None,
            obs_version,
        }
    }

    /// A failed connect
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
            obs_version: None,
        }
    }
}

/// Connection status as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No connect attempt yet
    Idle,
    /// Handshake in progress
    Connecting,
    /// Handshake completed, requests may be issued
    Open,
    /// Disconnected explicitly or by a transport failure
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Lifecycle and state-change notifications from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Closed,
    Error(String),
    CurrentSceneChanged(String),
    SceneListChanged,
}

/// A session event tagged with the connection generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEventEnvelope {
    pub generation: u64,
    pub event: SessionEvent,
}

/// Locally mirrored view of remote state.
///
/// Best effort only; the remote engine is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedState {
    pub current_scene: Option<String>,
    pub scenes: Vec<Scene>,
    pub connected: bool,
}

/// Per-scene result of applying a cross-scene toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneApplyResult {
    pub scene: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of toggling a source across every scene that holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub source: String,
    /// New enabled state applied to every matched item
    pub enabled: bool,
    pub succeeded: usize,
    pub attempted: usize,
    pub results: Vec<SceneApplyResult>,
}

impl ToggleOutcome {
    /// Some but not all scenes were updated
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && self.succeeded < self.attempted
    }

    /// Every matched scene was updated
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.attempted
    }
}

/// Whether an input kind identifies an audio source
pub fn is_audio_input_kind(kind: &str) -> bool {
    kind.contains("audio")
}

/// Whether an input kind identifies a video source
pub fn is_video_input_kind(kind: &str) -> bool {
    kind.contains("camera") || kind.contains("video") || kind.contains("capture")
}
