//! Command-line flags for the Ludo server.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use ludo::prelude::{BlockadePolicy, QueueConfig, RuleConfig, SessionConfig};

/// Ludo - networked game server with matchmaking
#[derive(Parser, Debug)]
#[command(name = "ludo-server")]
#[command(about = "WebSocket Ludo server with FIFO matchmaking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Seconds between sweeps for stale sessions
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,

    /// Seconds without a roll or move before a session is removed
    #[arg(long, default_value_t = 1800)]
    pub inactivity_timeout: u64,

    /// Seconds a finished game is kept so clients can read the result
    #[arg(long, default_value_t = 60)]
    pub finished_grace: u64,

    /// Accept `forcedValue` on roll_dice (testing and demos only)
    #[arg(long)]
    pub allow_forced_dice: bool,

    /// Whether two tokens on a safe tile form a blockade
    #[arg(long, value_enum, default_value_t = Blockades::SafeTilesExempt)]
    pub blockades: Blockades,

    /// Most players waiting in matchmaking at once
    #[arg(long, default_value_t = 1024)]
    pub max_waiting: usize,

    /// Log filter, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blockades {
    SafeTilesExempt,
    SafeTilesEnforced,
}

impl From<Blockades> for BlockadePolicy {
    fn from(b: Blockades) -> Self {
        match b {
            Blockades::SafeTilesExempt => BlockadePolicy::SafeTilesExempt,
            Blockades::SafeTilesEnforced => BlockadePolicy::SafeTilesEnforced,
        }
    }
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            rules: RuleConfig {
                blockade_policy: self.blockades.into(),
            },
            allow_forced_dice: self.allow_forced_dice,
            sweep_interval: Duration::from_secs(self.sweep_interval),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout),
            finished_grace: Duration::from_secs(self.finished_grace),
            ..SessionConfig::default()
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_waiting: self.max_waiting,
            ..QueueConfig::default()
        }
    }
}
