//! Input and scene-item commands

use anyhow::Result;
use clap::ValueEnum;

use crate::bridge::ObsBridge;
use crate::output::{format_sources, format_toggle_outcome, print_error, print_success, print_warning};

/// What `mute` should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteAction {
    Toggle,
    Set(bool),
    Status,
}

/// Input category listed by `sources`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Audio,
    Video,
}

/// Execute the mute command
pub async fn mute_command(bridge: &ObsBridge, source: &str, action: MuteAction) -> Result<()> {
    let result = match action {
        MuteAction::Toggle => bridge.toggle_mute(source).await,
        MuteAction::Set(muted) => bridge.set_mute(source, muted).await.map(|()| muted),
        MuteAction::Status => bridge.get_mute_status(source).await,
    };

    match result {
        Ok(muted) => {
            let state = if muted { "muted" } else { "unmuted" };
            if action == MuteAction::Status {
                println!("{}: {}", source, state);
            } else {
                print_success(&format!("{} {}", source, state));
            }
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Mute failed for {}: {}", source, e));
            Err(e.into())
        }
    }
}

/// Execute the camera command
pub async fn camera_command(bridge: &ObsBridge, source: &str, status_only: bool) -> Result<()> {
    if status_only {
        return match bridge.get_camera_status(source).await {
            Ok(enabled) => {
                println!("{}: {}", source, if enabled { "visible" } else { "hidden" });
                Ok(())
            }
            Err(e) => {
                print_error(&format!("Failed to get status of {}: {}", source, e));
                Err(e.into())
            }
        };
    }

    match bridge.toggle_source(source).await {
        Ok(outcome) => {
            if outcome.is_complete() {
                print_success(&format!(
                    "{} {}",
                    source,
                    if outcome.enabled { "shown" } else { "hidden" }
                ));
            } else {
                print_warning(&format!("{} only partially updated", source));
            }
            println!("{}", format_toggle_outcome(&outcome));
            if outcome.succeeded == 0 {
                anyhow::bail!("no scene was updated");
            }
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to toggle {}: {}", source, e));
            Err(e.into())
        }
    }
}

/// Execute the sources command
pub async fn sources_command(bridge: &ObsBridge, kind: SourceKind) -> Result<()> {
    let sources = match kind {
        SourceKind::Audio => bridge.get_audio_sources().await,
        SourceKind::Video => bridge.get_video_sources().await,
    };

    match sources {
        Ok(sources) => {
            println!("{}", format_sources(&sources));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to list sources: {}", e));
            Err(e.into())
        }
    }
}
