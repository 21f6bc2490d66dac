//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use lexo_client::{ClientIdentity, PracticeConfig};
use lexo_core::ConnectionConfig;

/// Terminal client for timed multiplayer word rounds.
#[derive(Debug, Parser)]
#[command(name = "lexo", version, about)]
pub struct Cli {
    /// Log filter directives. Logs go to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_filter: String,

    /// What to do.
    #[command(subcommand)]
    pub command: Mode,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Play networked rounds against a server.
    Play(PlayArgs),
    /// Play an offline round on your own.
    Practice(PracticeArgs),
}

/// Options for networked play.
#[derive(Debug, Clone, Args)]
pub struct PlayArgs {
    /// Server WebSocket endpoint.
    #[arg(long, env = "LEXO_URL", default_value = "ws://127.0.0.1:8080/ws")]
    pub url: String,

    /// Display name. Doubles as the identity when no token is given.
    #[arg(long, default_value = "guest")]
    pub name: String,

    /// Bearer credential sent with the join handshake.
    #[arg(long, env = "LEXO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Ask the server to restore an active session on start.
    #[arg(long)]
    pub resume: bool,

    /// Seconds between heartbeats.
    #[arg(long, default_value_t = 25)]
    pub heartbeat_secs: u64,

    /// Seconds to wait before each reconnect attempt.
    #[arg(long, default_value_t = 3)]
    pub reconnect_delay_secs: u64,

    /// Reconnect attempts after an unclean drop.
    #[arg(long, default_value_t = 5)]
    pub max_reconnects: u32,
}

impl PlayArgs {
    /// Identity presented to the server.
    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity { auth_token: self.token.clone(), ..ClientIdentity::guest(&self.name) }
    }

    /// Connection manager settings.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            max_reconnect_attempts: self.max_reconnects,
        }
    }
}

/// Options for an offline round.
#[derive(Debug, Clone, Args)]
pub struct PracticeArgs {
    /// Round length in seconds.
    #[arg(long, default_value_t = 60)]
    pub duration_secs: u32,

    /// Letters dealt.
    #[arg(long, default_value_t = 16)]
    pub pool_size: usize,

    /// Seed for a reproducible pool.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Newline-separated word list. Every well-formed word counts without it.
    #[arg(long)]
    pub words: Option<PathBuf>,
}

impl PracticeArgs {
    /// Practice round settings.
    pub fn config(&self) -> PracticeConfig {
        PracticeConfig {
            pool_size: self.pool_size,
            duration_seconds: self.duration_secs,
            ..PracticeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "lexo",
            "play",
            "--name",
            "Ada",
            "--token",
            "secret",
            "--reconnect-delay-secs",
            "1",
            "--max-reconnects",
            "2",
        ]);
        let Mode::Play(args) = cli.command else { panic!("expected play") };

        let identity = args.identity();
        assert_eq!(identity.display_name, "Ada");
        assert_eq!(identity.auth_token.as_deref(), Some("secret"));

        let config = args.connection_config();
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_attempts, 2);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(25));
    }

    #[test]
    fn practice_defaults() {
        let cli = Cli::parse_from(["lexo", "practice", "--seed", "9"]);
        let Mode::Practice(args) = cli.command else { panic!("expected practice") };
        let config = args.config();
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.duration_seconds, 60);
        assert_eq!(args.seed, Some(9));
    }
}
