//! Bridge and connection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;

/// Default OBS WebSocket server port
pub const DEFAULT_OBS_PORT: u16 = 4455;

/// Where and how to reach the OBS WebSocket server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Host name or IP address of the machine running OBS
    pub address: String,

    /// WebSocket server port
    pub port: u16,

    /// Server password; `None` when authentication is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: DEFAULT_OBS_PORT,
            password: None,
        }
    }
}

impl ConnectionConfig {
    /// WebSocket URL of the server
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}", self.address, self.port)
    }

    /// Whether a non-empty password is configured
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Timings and limits for the session supervisor and compound operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bound on the connect handshake
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,

    /// Wait after the handshake before the first scene-list load
    #[serde(with = "duration_millis")]
    pub settle_delay: Duration,

    /// Wait before the single retry of a scene-list load that hit "not ready"
    #[serde(with = "duration_millis")]
    pub not_ready_retry_delay: Duration,

    /// Bound on each request/response call
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,

    /// Scenes queried or updated concurrently by cross-scene operations
    pub scan_concurrency: usize,

    /// Server to connect to
    pub connection: ConnectionConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(1000),
            not_ready_retry_delay: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(10),
            scan_concurrency: 4,
            connection: ConnectionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        let config = ConnectionConfig {
            address: "192.168.1.20".to_string(),
            port: 4455,
            password: None,
        };
        assert_eq!(config.websocket_url(), "ws://192.168.1.20:4455");
    }

    #[test]
    fn test_has_password() {
        let mut config = ConnectionConfig::default();
        assert!(!config.has_password());
        config.password = Some(String::new());
        assert!(!config.has_password());
        config.password = Some("secret".to_string());
        assert!(config.has_password());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            settle_delay = 300

            [connection]
            address = "obs-box"
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.address, "obs-box");
        assert_eq!(config.connection.port, DEFAULT_OBS_PORT);
        assert_eq!(config.settle_delay, Duration::from_millis(300));
        assert_eq!(config.not_ready_retry_delay, Duration::from_millis(2000));
        assert_eq!(config.scan_concurrency, 4);
    }
}
