//! Scene listing and switching

use std::time::Duration;

use anyhow::Result;

use crate::bridge::ObsBridge;
use crate::output::{format_scenes, print_error, print_success};

/// Wait for the scene load scheduled by connect, up to `limit`
async fn wait_for_scenes(bridge: &ObsBridge, limit: Duration) -> bool {
    let mut rx = bridge.cache().subscribe();
    let loaded = async {
        loop {
            if !rx.borrow_and_update().scenes.is_empty() {
                return true;
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    };
    tokio::time::timeout(limit, loaded).await.unwrap_or(false)
}

/// Execute the scenes command
pub async fn scenes_command(bridge: &ObsBridge, refresh: bool) -> Result<()> {
    let config = bridge.config();
    let limit = config.settle_delay + config.not_ready_retry_delay + config.request_timeout;

    if refresh || !wait_for_scenes(bridge, limit).await {
        if let Err(e) = bridge.refresh_scenes().await {
            print_error(&format!("Failed to load scenes: {}", e));
            return Err(e.into());
        }
    }

    let scenes = bridge.get_scenes()?;
    let current = bridge.get_current_scene()?;
    println!("{}", format_scenes(&scenes, current.as_deref()));
    Ok(())
}

/// Execute the switch command
pub async fn switch_command(bridge: &ObsBridge, scene: &str) -> Result<()> {
    match bridge.switch_scene(scene).await {
        Ok(()) => {
            print_success(&format!("Switched to scene: {}", scene));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to switch scene: {}", e));
            Err(e.into())
        }
    }
}
