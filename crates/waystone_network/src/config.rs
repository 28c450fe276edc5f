//! Messaging core configuration types and defaults.

use crate::error::NetworkError;
use crate::messaging::TARGET_ALL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_engine_timeout_ms() -> u64 {
    10_000
}

fn default_safe_location_timeout_ms() -> u64 {
    5_000
}

fn default_api_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_batch_count() -> usize {
    100
}

/// Configuration for one server's messaging core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Name of the local server on the network
    pub server_name: String,

    /// Random-teleport timeouts and limits
    #[serde(default)]
    pub rtp: RtpConfig,
}

/// Random-teleport timeout policy and batch limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtpConfig {
    /// Upper bound on one random-teleport engine call; expiry counts as "no position"
    #[serde(default = "default_engine_timeout_ms")]
    pub engine_timeout_ms: u64,

    /// Upper bound on one safe-location lookup; expiry drops that candidate
    #[serde(default = "default_safe_location_timeout_ms")]
    pub safe_location_timeout_ms: u64,

    /// How long an outbound API RTP request waits for its answer
    #[serde(default = "default_api_request_timeout_ms")]
    pub api_request_timeout_ms: u64,

    /// Largest batch an inbound API RTP request may ask for
    #[serde(default = "default_max_batch_count")]
    pub max_batch_count: usize,
}

impl RtpConfig {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    pub fn safe_location_timeout(&self) -> Duration {
        Duration::from_millis(self.safe_location_timeout_ms)
    }

    pub fn api_request_timeout(&self) -> Duration {
        Duration::from_millis(self.api_request_timeout_ms)
    }
}

impl Default for RtpConfig {
    fn default() -> Self {
        Self {
            engine_timeout_ms: default_engine_timeout_ms(),
            safe_location_timeout_ms: default_safe_location_timeout_ms(),
            api_request_timeout_ms: default_api_request_timeout_ms(),
            max_batch_count: default_max_batch_count(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_name: "server".to_string(),
            rtp: RtpConfig::default(),
        }
    }
}

impl NetworkConfig {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.server_name.trim().is_empty() {
            return Err(NetworkError::Config("Server name cannot be empty".to_string()));
        }
        if self.server_name.eq_ignore_ascii_case(TARGET_ALL) {
            return Err(NetworkError::Config(format!(
                "Server name {TARGET_ALL:?} is reserved for broadcasts"
            )));
        }
        if self.rtp.engine_timeout_ms == 0
            || self.rtp.safe_location_timeout_ms == 0
            || self.rtp.api_request_timeout_ms == 0
        {
            return Err(NetworkError::Config(
                "RTP timeouts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rtp.engine_timeout(), Duration::from_secs(10));
        assert_eq!(config.rtp.max_batch_count, 100);
    }

    #[test]
    fn test_config_validation() {
        let mut config = NetworkConfig::new("");
        assert!(config.validate().is_err());

        config.server_name = "all".to_string();
        assert!(config.validate().is_err());

        config.server_name = "survival".to_string();
        config.rtp.safe_location_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.rtp.safe_location_timeout_ms = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rtp_defaults_fill_missing_fields() {
        let config: NetworkConfig = serde_json::from_str(r#"{ "server_name": "lobby" }"#)
            .expect("partial config should deserialize");
        assert_eq!(config.rtp.api_request_timeout_ms, 30_000);
        assert_eq!(config.rtp.safe_location_timeout_ms, 5_000);
    }
}
