//! CLI command implementations

mod config;
mod outputs;
mod scenes;
mod sources;
mod status;
mod watch;

use anyhow::Result;

use obs_core::config::BridgeConfig;

use crate::bridge::ObsBridge;
use crate::output::print_error;

pub use config::{config_init, config_path, config_show, load_bridge_config};
pub use outputs::{record_command, stream_command, OutputAction};
pub use scenes::{scenes_command, switch_command};
pub use sources::{camera_command, mute_command, sources_command, MuteAction, SourceKind};
pub use status::status_command;
pub use watch::watch_command;

/// Connect to the configured server, failing the command if that fails
pub async fn connect_bridge(config: BridgeConfig) -> Result<ObsBridge> {
    let bridge = ObsBridge::new(config);
    let result = bridge.connect_configured().await;
    if !result.connected {
        let error = result.error.unwrap_or_else(|| "unknown error".to_string());
        print_error(&format!(
            "Failed to connect to OBS at {}: {}",
            bridge.config().connection.websocket_url(),
            error
        ));
        anyhow::bail!("connection failed: {}", error);
    }
    Ok(bridge)
}
