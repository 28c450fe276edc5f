//! # Waystone - Node Entry Point
//!
//! Runs a whole teleport network in one process: every configured server
//! gets its own message handler and in-memory backend, connected through
//! the local network transport. This entry point handles CLI parsing,
//! configuration loading, and application lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! waystone
//!
//! # Specify custom configuration
//! waystone --config production.toml
//!
//! # Run only the named servers, with debug logs
//! waystone -s lobby -s survival --log-level debug
//!
//! # JSON logging for production
//! waystone --json-logs
//! ```
//!
//! ## Configuration
//!
//! The node loads configuration from a TOML file (default: `waystone.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The node shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM (Unix
//! systems). A second signal exits immediately.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the node.
///
/// Parses the command line, sets up logging from the configuration file
/// (with CLI overrides) and runs the application until shutdown.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    let config = Application::apply_overrides(config, &args);

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, NetworkSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_round_trips_through_toml() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let toml_content = toml::to_string_pretty(&config)
            .expect("Failed to serialize default config to TOML");
        let parsed: AppConfig = toml::from_str(&toml_content)
            .expect("Failed to parse serialized default config");
        assert_eq!(parsed.network.servers, config.network.servers);
        assert_eq!(parsed.rtp.engine_timeout_ms, config.rtp.engine_timeout_ms);
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("bad.toml");

        let mut config = AppConfig::default();
        config.logging.level = "shouting".to_string();
        tokio::fs::write(&config_path, toml::to_string_pretty(&config).unwrap())
            .await
            .unwrap();

        let args = CliArgs {
            config_path,
            log_level: None,
            json_logs: false,
            servers: Vec::new(),
        };
        assert!(Application::new(args).await.is_err());
    }
}
