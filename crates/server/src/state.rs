use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use plexsubs_core::{
    Config, PathDiscovery, PathMapper, Placer, PlayerClient, SanitizedConfig, SubtitleProvider,
    SubtitleService,
};

/// Shared application state
pub struct AppState {
    config: Config,
    service: SubtitleService,
    discovery: PathDiscovery,
    /// Cancelled on shutdown; every webhook run gets a child token.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        player: Arc<dyn PlayerClient>,
        provider: Arc<dyn SubtitleProvider>,
        placer: Arc<dyn Placer>,
        shutdown: CancellationToken,
    ) -> Self {
        let mapper = Arc::new(PathMapper::new(config.path_mappings.clone()));
        let service =
            SubtitleService::new(Arc::clone(&player), provider, placer, Arc::clone(&mapper), &config);
        let discovery = PathDiscovery::new(player, mapper, config.discovery.clone());
        Self {
            config,
            service,
            discovery,
            shutdown,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &SubtitleService {
        &self.service
    }

    pub fn discovery(&self) -> &PathDiscovery {
        &self.discovery
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
