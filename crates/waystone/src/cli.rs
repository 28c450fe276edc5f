//! Command-line interface handling for the waystone node.
//!
//! This module provides command-line argument parsing using the `clap`
//! crate.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// These options override configuration file settings.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Server names replacing the configured server list
    pub servers: Vec<String>,
}

impl CliArgs {
    /// Parses the process's command line arguments.
    ///
    /// Exits the process with a usage message if they are invalid.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses arguments from an explicit list, the first being the binary name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn command() -> Command {
        Command::new("waystone")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Runs a network of teleport servers in one process")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("waystone.toml"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("server")
                    .short('s')
                    .long("server")
                    .value_name("NAME")
                    .help("Run a server with this name; repeat for more (replaces configured servers)")
                    .action(ArgAction::Append),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("waystone.toml")),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            servers: matches
                .get_many::<String>("server")
                .map(|names| names.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["waystone"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("waystone.toml"));
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(args.servers.is_empty());
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "waystone",
            "-c",
            "net.toml",
            "-l",
            "debug",
            "--json-logs",
            "-s",
            "hub",
            "--server",
            "wild",
        ])
        .unwrap();
        assert_eq!(args.config_path, PathBuf::from("net.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.servers, vec!["hub", "wild"]);
    }
}
