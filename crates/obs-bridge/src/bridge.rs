//! Bridge facade
//!
//! `ObsBridge` is the single entry point a client uses: it wires a transport,
//! the session supervisor, the state cache and the compound operations
//! together. Every operation except connect, disconnect and status requires
//! an open session and fails with `NotConnected` otherwise, without touching
//! the transport.

use std::sync::Arc;

use serde_json::json;

use obs_core::config::{BridgeConfig, ConnectionConfig};
use obs_core::traits::Transport;
use obs_core::types::{is_audio_input_kind, is_video_input_kind};
use obs_core::{BridgeError, ConnectResult, ConnectionStatus, Scene, ToggleOutcome};
use obs_protocol::request::{InputListResponse, InputMuteResponse, OutputActiveResponse};
use obs_protocol::RequestType;

use crate::cache::StateCache;
use crate::operations::CompoundOps;
use crate::request::{request, request_unit};
use crate::session::SessionSupervisor;
use crate::transport::WebSocketTransport;

/// Remote control for one OBS instance
pub struct ObsBridge {
    config: BridgeConfig,
    supervisor: SessionSupervisor,
    ops: CompoundOps,
}

impl ObsBridge {
    /// Create a bridge speaking WebSocket to the server in `config`
    pub fn new(config: BridgeConfig) -> Self {
        let transport = Arc::new(WebSocketTransport::new(
            config.connect_timeout,
            config.request_timeout,
        ));
        Self::with_transport(config, transport)
    }

    /// Create a bridge over an existing transport
    pub fn with_transport(config: BridgeConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = Arc::new(StateCache::new());
        let supervisor = SessionSupervisor::new(Arc::clone(&transport), cache, &config);
        let ops = CompoundOps::new(transport, config.scan_concurrency);
        Self {
            config,
            supervisor,
            ops,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &SessionSupervisor {
        &self.supervisor
    }

    pub fn cache(&self) -> &Arc<StateCache> {
        self.supervisor.cache()
    }

    fn transport(&self) -> &dyn Transport {
        self.supervisor.transport().as_ref()
    }

    /// Connect to `connection`, replacing any open session
    pub async fn connect(&self, connection: &ConnectionConfig) -> ConnectResult {
        self.supervisor.connect(connection).await
    }

    /// Connect to the server named in the bridge configuration
    pub async fn connect_configured(&self) -> ConnectResult {
        self.supervisor.connect(&self.config.connection).await
    }

    pub async fn disconnect(&self) {
        self.supervisor.disconnect().await
    }

    pub fn get_connection_status(&self) -> ConnectionStatus {
        self.supervisor.connection_status()
    }

    /// Cached scene list
    pub fn get_scenes(&self) -> Result<Vec<Scene>, BridgeError> {
        self.supervisor.ensure_open()?;
        Ok(self.cache().scenes())
    }

    /// Cached current program scene
    pub fn get_current_scene(&self) -> Result<Option<String>, BridgeError> {
        self.supervisor.ensure_open()?;
        Ok(self.cache().current_scene())
    }

    pub async fn refresh_scenes(&self) -> Result<(), BridgeError> {
        self.supervisor.refresh_scenes().await
    }

    pub async fn switch_scene(&self, name: &str) -> Result<(), BridgeError> {
        self.supervisor.ensure_open()?;
        request_unit(
            self.transport(),
            RequestType::SetCurrentProgramScene,
            Some(json!({ "sceneName": name })),
        )
        .await?;

        tracing::info!("Switched to scene: {}", name);
        self.cache().apply_current_scene(name);
        Ok(())
    }

    /// Toggle the mute state of an input, returning the new state
    pub async fn toggle_mute(&self, source: &str) -> Result<bool, BridgeError> {
        self.supervisor.ensure_open()?;
        let response: InputMuteResponse = request(
            self.transport(),
            RequestType::ToggleInputMute,
            Some(json!({ "inputName": source })),
        )
        .await?;

        tracing::info!(
            "{} is now {}",
            source,
            if response.input_muted { "muted" } else { "unmuted" }
        );
        Ok(response.input_muted)
    }

    pub async fn set_mute(&self, source: &str, muted: bool) -> Result<(), BridgeError> {
        self.supervisor.ensure_open()?;
        request_unit(
            self.transport(),
            RequestType::SetInputMute,
            Some(json!({ "inputName": source, "inputMuted": muted })),
        )
        .await?;

        tracing::info!(
            "{} is now {}",
            source,
            if muted { "muted" } else { "unmuted" }
        );
        Ok(())
    }

    pub async fn get_mute_status(&self, source: &str) -> Result<bool, BridgeError> {
        self.supervisor.ensure_open()?;
        let response: InputMuteResponse = request(
            self.transport(),
            RequestType::GetInputMute,
            Some(json!({ "inputName": source })),
        )
        .await?;
        Ok(response.input_muted)
    }

    /// Toggle a source in every scene that holds it, returning the new state
    pub async fn toggle_camera(&self, source: &str) -> Result<bool, BridgeError> {
        Ok(self.toggle_source(source).await?.enabled)
    }

    /// Toggle a source in every scene that holds it, with per-scene results
    pub async fn toggle_source(&self, source: &str) -> Result<ToggleOutcome, BridgeError> {
        self.supervisor.ensure_open()?;
        self.ops.toggle_source(source).await
    }

    pub async fn get_camera_status(&self, source: &str) -> Result<bool, BridgeError> {
        self.supervisor.ensure_open()?;
        self.ops.source_enabled(source).await
    }

    /// Toggle recording, returning whether it is now active
    pub async fn toggle_recording(&self) -> Result<bool, BridgeError> {
        self.toggle_output(RequestType::ToggleRecord, "Recording").await
    }

    pub async fn start_recording(&self) -> Result<(), BridgeError> {
        self.output_command(RequestType::StartRecord, "Recording started")
            .await
    }

    pub async fn stop_recording(&self) -> Result<(), BridgeError> {
        self.output_command(RequestType::StopRecord, "Recording stopped")
            .await
    }

    pub async fn get_recording_status(&self) -> Result<bool, BridgeError> {
        self.output_status(RequestType::GetRecordStatus).await
    }

    /// Toggle streaming, returning whether it is now active
    pub async fn toggle_streaming(&self) -> Result<bool, BridgeError> {
        self.toggle_output(RequestType::ToggleStream, "Streaming").await
    }

    pub async fn start_streaming(&self) -> Result<(), BridgeError> {
        self.output_command(RequestType::StartStream, "Streaming started")
            .await
    }

    pub async fn stop_streaming(&self) -> Result<(), BridgeError> {
        self.output_command(RequestType::StopStream, "Streaming stopped")
            .await
    }

    pub async fn get_streaming_status(&self) -> Result<bool, BridgeError> {
        self.output_status(RequestType::GetStreamStatus).await
    }

    /// Names of inputs whose kind identifies an audio source
    pub async fn get_audio_sources(&self) -> Result<Vec<String>, BridgeError> {
        self.inputs_matching(is_audio_input_kind).await
    }

    /// Names of inputs whose kind identifies a video source
    pub async fn get_video_sources(&self) -> Result<Vec<String>, BridgeError> {
        self.inputs_matching(is_video_input_kind).await
    }

    async fn toggle_output(&self, toggle: RequestType, label: &str) -> Result<bool, BridgeError> {
        self.supervisor.ensure_open()?;
        let response: OutputActiveResponse = request(self.transport(), toggle, None).await?;
        tracing::info!(
            "{} {}",
            label,
            if response.output_active { "started" } else { "stopped" }
        );
        Ok(response.output_active)
    }

    async fn output_command(&self, command: RequestType, done: &str) -> Result<(), BridgeError> {
        self.supervisor.ensure_open()?;
        request_unit(self.transport(), command, None).await?;
        tracing::info!("{}", done);
        Ok(())
    }

    async fn output_status(&self, status: RequestType) -> Result<bool, BridgeError> {
        self.supervisor.ensure_open()?;
        let response: OutputActiveResponse = request(self.transport(), status, None).await?;
        Ok(response.output_active)
    }

    async fn inputs_matching(&self, matches: fn(&str) -> bool) -> Result<Vec<String>, BridgeError> {
        self.supervisor.ensure_open()?;
        let response: InputListResponse =
            request(self.transport(), RequestType::GetInputList, None).await?;

        Ok(response
            .inputs
            .into_iter()
            .filter(|input| input.input_kind.as_deref().is_some_and(matches))
            .map(|input| input.input_name)
            .collect())
    }
}
