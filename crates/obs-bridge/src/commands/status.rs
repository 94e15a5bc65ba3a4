//! Status command implementation

use anyhow::Result;

use obs_core::config::BridgeConfig;

use crate::bridge::ObsBridge;
use crate::output::{format_status, StatusReport};

/// Execute the status command.
///
/// Connects on its own so a failed connect is still reported as a status.
pub async fn status_command(config: BridgeConfig) -> Result<()> {
    let bridge = ObsBridge::new(config);
    let address = bridge.config().connection.websocket_url();
    let result = bridge.connect_configured().await;

    if !result.connected {
        let status = bridge.get_connection_status();
        print!(
            "{}",
            format_status(&StatusReport {
                address,
                connected: false,
                error: status.error.or(result.error),
                obs_version: None,
                current_scene: None,
                recording: None,
                streaming: None,
            })
        );
        anyhow::bail!("not connected to OBS");
    }

    if let Err(e) = bridge.refresh_scenes().await {
        tracing::warn!("Could not load scenes: {}", e);
    }

    let report = StatusReport {
        address,
        connected: true,
        error: None,
        obs_version: result.obs_version,
        current_scene: bridge.get_current_scene().ok().flatten(),
        recording: bridge.get_recording_status().await.ok(),
        streaming: bridge.get_streaming_status().await.ok(),
    };
    print!("{}", format_status(&report));

    bridge.disconnect().await;
    Ok(())
}
