//! Subtitle acquisition configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::language::LanguagePreference;

/// `[subtitles]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Wanted languages, most preferred first.
    #[serde(default)]
    pub languages: LanguagePreference,
    /// Switch the live session to a new subtitle (default: true)
    #[serde(default = "default_true")]
    pub auto_select: bool,
    /// Score candidates against the media's release signature (default: true)
    #[serde(default = "default_true")]
    pub use_release_matching: bool,
    /// Replace an existing subtitle when a perfect release match turns up (default: true)
    #[serde(default = "default_true")]
    pub upgrade_on_perfect_match: bool,
    /// Extra download attempts after the first one fails (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay between download attempts in seconds (default: 5)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            languages: LanguagePreference::default(),
            auto_select: true,
            use_release_matching: true,
            upgrade_on_perfect_match: true,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl AcquisitionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
