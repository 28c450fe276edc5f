//! Configuration management for the waystone node.
//!
//! This module handles loading, validation, and conversion of node
//! configuration from TOML files and command-line arguments.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;
use waystone_network::{NetworkConfig, RtpConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_worlds() -> Vec<String> {
    vec!["world".to_string()]
}

fn default_stats_interval_secs() -> u64 {
    60
}

/// Application configuration loaded from TOML file.
///
/// This is the main configuration structure that encompasses the servers
/// of the local network, the random teleport policy and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Servers of the local network
    pub network: NetworkSettings,
    /// Random teleport timeouts and batch cap, shared by every server
    #[serde(default)]
    pub rtp: RtpConfig,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// The servers hosted by this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Interval between handler statistics reports, in seconds
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    pub servers: Vec<ServerSettings>,
}

/// One server of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Unique server name on the network
    pub name: String,
    /// Worlds hosted by this server
    #[serde(default = "default_worlds")]
    pub worlds: Vec<String>,
    /// Players online on this server at startup
    #[serde(default)]
    pub players: Vec<String>,
}

impl ServerSettings {
    /// A server with the default world and no players.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worlds: default_worlds(),
            players: Vec::new(),
        }
    }
}

/// Logging system configuration.
///
/// Controls log output format and level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkSettings {
                stats_interval_secs: default_stats_interval_secs(),
                servers: vec![
                    ServerSettings {
                        name: "lobby".to_string(),
                        worlds: default_worlds(),
                        players: vec!["alice".to_string()],
                    },
                    ServerSettings {
                        name: "survival".to_string(),
                        worlds: vec!["world".to_string(), "world_nether".to_string()],
                        players: vec!["bob".to_string()],
                    },
                ],
            },
            rtp: RtpConfig::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// The messaging core configuration of one configured server.
    pub fn to_network_config(&self, server: &ServerSettings) -> NetworkConfig {
        NetworkConfig {
            server_name: server.name.clone(),
            rtp: self.rtp.clone(),
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.network.servers.is_empty() {
            return Err("At least one server must be configured".to_string());
        }

        let mut names = HashSet::new();
        for server in &self.network.servers {
            self.to_network_config(server)
                .validate()
                .map_err(|e| format!("Server {:?}: {e}", server.name))?;

            if !names.insert(server.name.as_str()) {
                return Err(format!("Duplicate server name: {}", server.name));
            }
            if server.worlds.is_empty() {
                return Err(format!("Server {} hosts no worlds", server.name));
            }
        }

        if self.network.stats_interval_secs == 0 {
            return Err("Stats interval must be greater than 0".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
