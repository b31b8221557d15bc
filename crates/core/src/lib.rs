pub mod acquisition;
pub mod config;
pub mod language;
pub mod metrics;
pub mod paths;
pub mod placer;
pub mod player;
pub mod provider;
pub mod release;
pub mod service;
pub mod switch;
pub mod testing;

pub use acquisition::{
    AcquisitionOrchestrator, AcquisitionReport, AcquisitionStatus, LanguageOutcome, MediaItem,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use language::{LanguageDetector, LanguagePreference};
pub use paths::{PathDiscovery, PathMapper, PathMapping};
pub use placer::{FsPlacer, Placer};
pub use player::{PlayerClient, PlexClient};
pub use provider::{OpenSubtitlesClient, SubtitleProvider};
pub use service::{MediaStarted, RunReport, ServiceError, SubtitleService, SwitchStatus};
pub use switch::{PlaybackSwitchCoordinator, SwitchOutcome};
