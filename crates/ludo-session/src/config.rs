//! Session settings.

use std::time::Duration;

use ludo_engine::RuleConfig;
use serde::{Deserialize, Serialize};

/// Configuration shared by every session the registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rule variants for new games.
    pub rules: RuleConfig,

    /// Accept `forcedValue` on `roll_dice`. Meant for tests and demos.
    pub allow_forced_dice: bool,

    /// How often the server looks for sessions to remove.
    pub sweep_interval: Duration,

    /// A session with no roll or move for this long is removed.
    pub inactivity_timeout: Duration,

    /// How long a finished game stays around so clients can read the result.
    pub finished_grace: Duration,

    /// Bound of each session actor's command channel.
    pub channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            allow_forced_dice: false,
            sweep_interval: Duration::from_secs(5 * 60),
            inactivity_timeout: Duration::from_secs(30 * 60),
            finished_grace: Duration::from_secs(60),
            channel_size: 64,
        }
    }
}
