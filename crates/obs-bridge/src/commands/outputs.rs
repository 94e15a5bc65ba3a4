//! Recording and streaming commands

use anyhow::Result;
use clap::ValueEnum;

use obs_core::BridgeError;

use crate::bridge::ObsBridge;
use crate::output::{print_error, print_success};

/// Action on an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputAction {
    Toggle,
    Start,
    Stop,
    Status,
}

/// Execute the record command
pub async fn record_command(bridge: &ObsBridge, action: OutputAction) -> Result<()> {
    let result = match action {
        OutputAction::Toggle => bridge.toggle_recording().await,
        OutputAction::Start => bridge.start_recording().await.map(|()| true),
        OutputAction::Stop => bridge.stop_recording().await.map(|()| false),
        OutputAction::Status => bridge.get_recording_status().await,
    };
    report("Recording", action, result)
}

/// Execute the stream command
pub async fn stream_command(bridge: &ObsBridge, action: OutputAction) -> Result<()> {
    let result = match action {
        OutputAction::Toggle => bridge.toggle_streaming().await,
        OutputAction::Start => bridge.start_streaming().await.map(|()| true),
        OutputAction::Stop => bridge.stop_streaming().await.map(|()| false),
        OutputAction::Status => bridge.get_streaming_status().await,
    };
    report("Streaming", action, result)
}

fn report(
    output: &str,
    action: OutputAction,
    result: Result<bool, BridgeError>,
) -> Result<()> {
    match result {
        Ok(active) => {
            let state = if active { "active" } else { "inactive" };
            if action == OutputAction::Status {
                println!("{}: {}", output, state);
            } else {
                print_success(&format!("{} {}", output, state));
            }
            Ok(())
        }
        Err(e) => {
            print_error(&format!("{} {:?} failed: {}", output, action, e));
            Err(e.into())
        }
    }
}
