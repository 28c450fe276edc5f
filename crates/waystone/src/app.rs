//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that builds the local
//! network of servers, keeps an eye on it while it runs, and shuts it down
//! on a termination signal.

use crate::cli::CliArgs;
use crate::config::{AppConfig, ServerSettings};
use crate::logging::display_banner;
use crate::signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use waystone_network::{
    HandlerStatsSnapshot, LocalNetwork, MemoryBackend, MessageHandler, NetworkError,
    NetworkServices, Position, UserDirectory,
};

/// One server of the running network.
pub struct Node {
    pub backend: Arc<MemoryBackend>,
    pub handler: Arc<MessageHandler>,
    inbox: JoinHandle<()>,
}

impl Node {
    pub fn name(&self) -> &str {
        self.handler.server_name()
    }
}

/// Main application struct.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides and validates the result.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let config = AppConfig::load_from_file(&args.config_path).await?;
        let config = Self::apply_overrides(config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();
        Ok(Self { config })
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(mut config: AppConfig, args: &CliArgs) -> AppConfig {
        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if !args.servers.is_empty() {
            config.network.servers = args.servers.iter().map(ServerSettings::named).collect();
        }

        config
    }

    /// Builds the local network with one handler and backend per configured server.
    pub fn build_network(
        config: &AppConfig,
    ) -> Result<(Arc<LocalNetwork>, Vec<Node>), NetworkError> {
        let network = LocalNetwork::new();
        let mut nodes = Vec::with_capacity(config.network.servers.len());

        for server in &config.network.servers {
            let backend = Arc::new(MemoryBackend::new(server.name.clone()));
            let worlds: Vec<_> = server
                .worlds
                .iter()
                .map(|name| backend.add_world(name.clone()))
                .collect();

            if let Some(spawn) = worlds.first() {
                for (index, player) in server.players.iter().enumerate() {
                    let x = index as f64 * 16.0;
                    let position = Position::at(x, 64.0, 0.0, spawn.clone(), server.name.clone());
                    backend.add_online_user(player.clone(), position);
                }
            }

            let services = NetworkServices::from_backend(backend.clone(), network.clone());
            let network_config = config.to_network_config(server);
            let handler = Arc::new(MessageHandler::new(network_config, services)?);
            let inbox = network.attach(handler.clone());

            info!(
                "🖥️ Server {} ready: {} worlds, {} players online",
                server.name,
                worlds.len(),
                server.players.len()
            );
            nodes.push(Node {
                backend,
                handler,
                inbox,
            });
        }

        Ok((network, nodes))
    }

    /// Runs the network until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting waystone network");
        self.log_configuration_summary();

        let (network, nodes) = Self::build_network(&self.config)?;

        // Initial user list sync
        for node in &nodes {
            let via = node.backend.online_users().into_iter().next();
            if let Err(e) = node.handler.request_user_lists(via.as_ref()).await {
                warn!("⚠️ Initial user list sync from {} failed: {}", node.name(), e);
            }
        }

        let monitoring_handle = {
            let handlers: Vec<Arc<MessageHandler>> =
                nodes.iter().map(|node| node.handler.clone()).collect();
            let period = Duration::from_secs(self.config.network.stats_interval_secs);

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                let mut last = HandlerStatsSnapshot::default();

                loop {
                    interval.tick().await;
                    let total = total_stats(&handlers);
                    info!(
                        "📊 Network Health - {} messages handled (+{}) | {} replies | {} malformed | {} send failures",
                        total.messages_handled,
                        total.messages_handled.saturating_sub(last.messages_handled),
                        total.replies_sent,
                        total.malformed_dropped,
                        total.send_failures
                    );
                    last = total;
                }
            })
        };

        info!("✅ Waystone network is now running with {} servers", nodes.len());
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal().await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        monitoring_handle.abort();
        network.shutdown();

        for node in nodes {
            let name = node.name().to_string();
            if tokio::time::timeout(Duration::from_secs(5), node.inbox).await.is_err() {
                warn!("⏰ Inbox of {} did not drain within timeout", name);
            }
            let stats = node.handler.stats().snapshot();
            info!(
                "📊 {}: {} handled, {} replies, {} malformed, {} send failures",
                name,
                stats.messages_handled,
                stats.replies_sent,
                stats.malformed_dropped,
                stats.send_failures
            );
        }

        info!("✅ Waystone shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        for server in &self.config.network.servers {
            info!(
                "  🖥️ {}: worlds [{}], players [{}]",
                server.name,
                server.worlds.join(", "),
                server.players.join(", ")
            );
        }
        info!(
            "  ⏱️ RTP timeouts: engine {}ms, safe location {}ms, API request {}ms",
            self.config.rtp.engine_timeout_ms,
            self.config.rtp.safe_location_timeout_ms,
            self.config.rtp.api_request_timeout_ms
        );
        info!("  🎲 Max API batch: {}", self.config.rtp.max_batch_count);
    }
}

/// Sums the statistics of every handler.
fn total_stats(handlers: &[Arc<MessageHandler>]) -> HandlerStatsSnapshot {
    handlers
        .iter()
        .map(|handler| handler.stats().snapshot())
        .fold(HandlerStatsSnapshot::default(), |acc, stats| HandlerStatsSnapshot {
            messages_handled: acc.messages_handled + stats.messages_handled,
            malformed_dropped: acc.malformed_dropped + stats.malformed_dropped,
            replies_sent: acc.replies_sent + stats.replies_sent,
            send_failures: acc.send_failures + stats.send_failures,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use waystone_network::WorldRegistry;

    fn args(servers: &[&str]) -> CliArgs {
        CliArgs {
            config_path: PathBuf::from("unused.toml"),
            log_level: Some("debug".to_string()),
            json_logs: true,
            servers: servers.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn test_cli_overrides_replace_servers() {
        let config = Application::apply_overrides(AppConfig::default(), &args(&["hub", "wild"]));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        let names: Vec<_> = config.network.servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["hub", "wild"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_server_override_keeps_config() {
        let config = Application::apply_overrides(AppConfig::default(), &args(&[]));
        assert_eq!(config.network.servers, AppConfig::default().network.servers);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_build_network_seeds_servers() {
        let config = AppConfig::default();
        let (network, nodes) = Application::build_network(&config).unwrap();

        assert_eq!(network.servers(), vec!["lobby", "survival"]);
        assert_eq!(nodes[0].backend.online_users().len(), 1);
        assert_eq!(nodes[1].backend.worlds().len(), 2);
        assert_eq!(
            nodes[1].backend.find_online_user("bob").map(|u| u.position.server),
            Some("survival".to_string())
        );

        network.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_initial_sync_fills_user_lists() {
        let config = AppConfig::default();
        let (network, nodes) = Application::build_network(&config).unwrap();

        for node in &nodes {
            node.handler.request_user_lists(None).await.unwrap();
        }

        let mut synced = false;
        for _ in 0..100 {
            synced = nodes[0].backend.user_list("survival").is_some()
                && nodes[1].backend.user_list("lobby").is_some();
            if synced {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(synced);

        let total = total_stats(&nodes.iter().map(|node| node.handler.clone()).collect::<Vec<_>>());
        assert!(total.messages_handled >= 4);

        network.shutdown();
    }
}
