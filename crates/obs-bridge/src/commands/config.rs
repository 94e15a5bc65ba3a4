//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use obs_core::config::{self, BridgeConfig};
use obs_core::ConfigError;

use crate::output::{print_error, print_info, print_success, print_warning};

fn resolve_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path)
}

/// Load the bridge configuration.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_bridge_config(config_path: Option<&Path>) -> Result<BridgeConfig> {
    let path = resolve_path(config_path);
    match config::load_config::<BridgeConfig>(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) if config_path.is_none() => {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(BridgeConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", path)),
    }
}

/// Show the effective configuration, without the password
pub fn config_show(config_path: Option<&Path>, effective: &BridgeConfig) -> Result<()> {
    let path = resolve_path(config_path);
    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Run 'obs-remote config init' to create one");
    }
    println!();

    let mut shown = effective.clone();
    if shown.connection.has_password() {
        shown.connection.password = Some("********".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&Path>) {
    println!("{}", resolve_path(config_path).display());
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = resolve_path(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        anyhow::bail!("config file already exists");
    }

    config::save_config(&path, &BridgeConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}
