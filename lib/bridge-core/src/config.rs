//! Importer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the supported configurations (comma-separated)
pub const ENV_SUPPORTED_CONFIGS: &str = "IMPORT_BRIDGE_CONFIGS";

/// Environment variable overriding the remote call timeout, in seconds
pub const ENV_CALL_TIMEOUT_SECS: &str = "IMPORT_BRIDGE_CALL_TIMEOUT_SECS";

/// Configuration of the endpoint importer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Export configurations handled by this importer
    pub supported_configs: Vec<String>,
    /// Property holding the comma-separated access URLs
    pub access_url_property: String,
    /// Property holding the remote endpoint name
    pub name_property: String,
    /// Property holding the remote service ID, used to synthesize a name
    pub service_id_property: String,
    /// Placeholder replaced by the endpoint server in access URLs
    pub server_placeholder: String,
    /// Timeout of a single remote call, in seconds
    pub call_timeout_secs: u64,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            supported_configs: vec!["jabsorbrpc".to_string(), "jabsorb-rpc".to_string()],
            access_url_property: "jabsorb.http.accesses".to_string(),
            name_property: "endpoint.name".to_string(),
            service_id_property: "endpoint.service.id".to_string(),
            server_placeholder: "{server}".to_string(),
            call_timeout_secs: 30,
        }
    }
}

impl ImporterConfig {
    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        let configs = std::env::var(ENV_SUPPORTED_CONFIGS).ok();
        let timeout = std::env::var(ENV_CALL_TIMEOUT_SECS).ok();
        self.with_overrides(configs.as_deref(), timeout.as_deref())
    }

    /// Apply raw override values; invalid values keep the current setting
    pub fn with_overrides(mut self, configs: Option<&str>, call_timeout_secs: Option<&str>) -> Self {
        if let Some(raw) = configs {
            let parsed: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|config| !config.is_empty())
                .map(str::to_string)
                .collect();
            if parsed.is_empty() {
                warn!("Ignoring empty supported configurations override");
            } else {
                self.supported_configs = parsed;
            }
        }

        if let Some(raw) = call_timeout_secs {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.call_timeout_secs = secs,
                _ => warn!("Ignoring invalid call timeout override: {:?}", raw),
            }
        }

        self
    }

    /// Check if any of the given export configurations is handled
    pub fn supports(&self, configurations: &[String]) -> bool {
        configurations
            .iter()
            .any(|config| self.supported_configs.iter().any(|handled| handled == config))
    }

    /// Timeout of a single remote call
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
