//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// notifywatch - desktop notification delivery client
#[derive(Parser)]
#[command(
    name = "nw",
    about = "Deliver backend notifications to the desktop over push with polling fallback",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch for notifications until interrupted (default)
    Watch {
        /// Override polling.interval-secs
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,

        /// Enable the push channel regardless of config
        #[arg(long, conflicts_with = "no_push")]
        push: bool,

        /// Disable the push channel regardless of config
        #[arg(long)]
        no_push: bool,
    },

    /// Check that the notifications API is reachable
    TestApi,

    /// Show a sample popup and wait for it to close
    TestNotification,

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as YAML
    Show,

    /// Write a default config file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Command {
    /// Apply `watch` overrides to a loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        debug!(?self, "Command::apply_overrides: called");
        if let Command::Watch {
            interval,
            push,
            no_push,
        } = self
        {
            if let Some(secs) = interval {
                config.polling.interval_secs = *secs;
            }
            if *push {
                config.push.enabled = true;
            }
            if *no_push {
                config.push.enabled = false;
            }
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifywatch")
        .join("logs")
        .join("notifywatch.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Default destination of `nw config init`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifywatch")
        .join("notifywatch.yml")
}

/// Generate the after_help text with config search paths and the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Config search order:\n");
    for path in Config::search_paths() {
        let icon = if path.exists() { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {}\n", icon, path.display()));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["nw"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_watch_overrides() {
        let cli = Cli::parse_from(["nw", "watch", "--interval", "30", "--push"]);
        let command = cli.command.unwrap();

        let mut config = Config::default();
        command.apply_overrides(&mut config);
        assert_eq!(config.polling.interval_secs, 30);
        assert!(config.push.enabled);
    }

    #[test]
    fn test_cli_push_flags_conflict() {
        assert!(Cli::try_parse_from(["nw", "watch", "--push", "--no-push"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::parse_from(["nw", "-l", "debug", "config", "init", "/tmp/nw.yml", "--force"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Config {
                command: ConfigCommand::Init { path, force },
            }) => {
                assert_eq!(path, Some(PathBuf::from("/tmp/nw.yml")));
                assert!(force);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["nw", "-c", "/path/to/config.yml", "test-api"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert!(matches!(cli.command, Some(Command::TestApi)));
    }

    #[test]
    fn test_overrides_ignored_for_other_commands() {
        let mut config = Config::default();
        Command::TestApi.apply_overrides(&mut config);
        assert_eq!(config.polling.interval_secs, 5);
    }

    #[test]
    fn test_log_path_location() {
        let path = get_log_path();
        assert!(path.ends_with("notifywatch/logs/notifywatch.log"));
    }
}
