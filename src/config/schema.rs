//! Configuration schema definitions.
//!
//! This module defines the service configuration (where to listen, where the
//! settings live, how the relay is probed). The global settings record itself
//! is not configured here; it is owned by the settings store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the settings service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Settings persistence.
    pub storage: StorageConfig,

    /// Event relay integration.
    pub relay: RelayConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8081").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Where and how the global settings are persisted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the settings file (JSON).
    pub settings_path: String,

    /// Path of the secret key file. Defaults to `settings.key` next to the
    /// settings file.
    pub key_path: Option<String>,

    /// Reload the settings when the file changes on disk.
    pub watch: bool,
}

impl StorageConfig {
    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.settings_path)
    }

    pub fn key_path(&self) -> PathBuf {
        match &self.key_path {
            Some(path) => PathBuf::from(path),
            None => self.settings_path().with_file_name("settings.key"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: "data/relay-settings.json".to_string(),
            key_path: None,
            watch: false,
        }
    }
}

/// Event relay integration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Probe the broker on reinit. When false, reinit is a no-op.
    pub enabled: bool,

    /// Broker connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Reinitialize once at startup if the stored settings are valid.
    pub reinit_on_startup: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            connect_timeout_secs: 5,
            reinit_on_startup: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when RUST_LOG is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("[listener]\nbind_address = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.relay.connect_timeout_secs, 5);
        assert!(!config.storage.watch);
    }

    #[test]
    fn test_key_path_defaults_next_to_settings() {
        let storage = StorageConfig {
            settings_path: "/var/lib/relay/settings.json".into(),
            ..Default::default()
        };
        assert_eq!(storage.key_path(), PathBuf::from("/var/lib/relay/settings.key"));

        let storage = StorageConfig {
            key_path: Some("/etc/relay/key".into()),
            ..storage
        };
        assert_eq!(storage.key_path(), PathBuf::from("/etc/relay/key"));
    }
}
