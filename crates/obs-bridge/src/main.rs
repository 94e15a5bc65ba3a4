//! obs-remote CLI
//!
//! One-shot remote control for OBS Studio over the OBS WebSocket protocol.
//! Each command connects, performs a single operation and disconnects.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use obs_bridge::commands::{self, MuteAction, OutputAction, SourceKind};
use obs_core::config::BridgeConfig;

#[derive(Parser)]
#[command(name = "obs-remote")]
#[command(author, version, about = "Remote control for OBS Studio")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OBS host (overrides config)
    #[arg(long, global = true, env = "OBS_ADDRESS")]
    address: Option<String>,

    /// OBS WebSocket port (overrides config)
    #[arg(long, global = true, env = "OBS_PORT")]
    port: Option<u16>,

    /// OBS WebSocket password (overrides config)
    #[arg(long, global = true, env = "OBS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connection, scene and output status
    Status,

    /// List scenes
    Scenes {
        /// Reload from OBS instead of waiting for the initial load
        #[arg(short, long)]
        refresh: bool,
    },

    /// Switch the program scene
    Switch {
        /// Scene name
        scene: String,
    },

    /// Toggle, set or query the mute state of an input
    Mute {
        /// Input name
        source: String,
        /// Mute the input
        #[arg(long, conflicts_with_all = ["off", "status"])]
        on: bool,
        /// Unmute the input
        #[arg(long, conflicts_with = "status")]
        off: bool,
        /// Print the mute state only
        #[arg(long)]
        status: bool,
    },

    /// Toggle a source in every scene that holds it
    Camera {
        /// Source name
        source: String,
        /// Print the visibility only
        #[arg(long)]
        status: bool,
    },

    /// Control recording
    Record {
        #[arg(value_enum, default_value = "status")]
        action: OutputAction,
    },

    /// Control streaming
    Stream {
        #[arg(value_enum, default_value = "status")]
        action: OutputAction,
    },

    /// List audio or video inputs
    Sources {
        #[arg(value_enum)]
        kind: SourceKind,
    },

    /// Print program scene changes until interrupted
    Watch,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => {
                let config = effective_config(&cli)?;
                commands::config_show(config_path, &config)
            }
            ConfigAction::Path => {
                commands::config_path(config_path);
                Ok(())
            }
            ConfigAction::Init { force } => commands::config_init(config_path, *force),
        };
    }

    let config = effective_config(&cli)?;

    if let Commands::Status = cli.command {
        return commands::status_command(config).await;
    }

    let bridge = commands::connect_bridge(config).await?;

    let result = match cli.command {
        Commands::Scenes { refresh } => commands::scenes_command(&bridge, refresh).await,
        Commands::Switch { scene } => commands::switch_command(&bridge, &scene).await,
        Commands::Mute {
            source,
            on,
            off,
            status,
        } => {
            let action = match (on, off, status) {
                (_, _, true) => MuteAction::Status,
                (true, _, _) => MuteAction::Set(true),
                (_, true, _) => MuteAction::Set(false),
                _ => MuteAction::Toggle,
            };
            commands::mute_command(&bridge, &source, action).await
        }
        Commands::Camera { source, status } => {
            commands::camera_command(&bridge, &source, status).await
        }
        Commands::Record { action } => commands::record_command(&bridge, action).await,
        Commands::Stream { action } => commands::stream_command(&bridge, action).await,
        Commands::Sources { kind } => commands::sources_command(&bridge, kind).await,
        Commands::Watch => commands::watch_command(&bridge).await,
        Commands::Status | Commands::Config { .. } => Ok(()),
    };

    bridge.disconnect().await;
    result
}

/// Config file merged with flag and environment overrides
fn effective_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = commands::load_bridge_config(cli.config.as_deref())?;

    if let Some(address) = &cli.address {
        config.connection.address = address.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(password) = &cli.password {
        config.connection.password = Some(password.clone());
    }

    Ok(config)
}
