use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[switch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwitchConfig {
    /// Give up on the live switch after this many seconds (default: 20)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Session poll interval in milliseconds (default: 2000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Make the new subtitle the item's default when the live switch fails (default: true)
    #[serde(default = "default_true")]
    pub set_default_on_give_up: bool,
}

fn default_timeout() -> u64 {
    20
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            poll_interval_ms: default_poll_interval(),
            set_default_on_give_up: true,
        }
    }
}

impl SwitchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
