//! Library-driven path discovery.
//!
//! Pulls sample file paths from the player's libraries and runs them through
//! validation and suggestion. Suggestions are only reported; the active
//! mapping table is never changed.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::player::{Library, PlayerClient, PlayerError};

use super::mapper::PathMapper;
use super::suggest::{suggest, MappingSuggestion};
use super::validate::{validate_paths, ValidationReport};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    #[error("Local scan failed: {0}")]
    ScanFailed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryStatus {
    pub enabled: bool,
    pub validate_on_startup: bool,
    pub mappings_configured: usize,
    pub local_roots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
}

pub struct PathDiscovery {
    player: Arc<dyn PlayerClient>,
    mapper: Arc<PathMapper>,
    config: DiscoveryConfig,
}

impl PathDiscovery {
    pub fn new(
        player: Arc<dyn PlayerClient>,
        mapper: Arc<PathMapper>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            player,
            mapper,
            config,
        }
    }

    pub fn status(&self) -> DiscoveryStatus {
        DiscoveryStatus {
            enabled: self.config.enabled,
            validate_on_startup: self.config.validate_on_startup,
            mappings_configured: self.mapper.mappings().len(),
            local_roots: self
                .config
                .local_roots
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            test_file: self.config.test_file.clone(),
        }
    }

    pub async fn libraries(&self) -> Result<Vec<Library>, DiscoveryError> {
        Ok(self.player.list_libraries().await?)
    }

    /// The configured test file, or a few files from every video library.
    /// A library that fails to list is skipped.
    pub async fn sample_paths(&self) -> Result<Vec<String>, DiscoveryError> {
        if let Some(test_file) = &self.config.test_file {
            return Ok(vec![test_file.clone()]);
        }

        let mut samples = Vec::new();
        for library in self.libraries().await?.iter().filter(|l| l.is_video()) {
            match self
                .player
                .library_file_paths(library, self.config.samples_per_library)
                .await
            {
                Ok(paths) => {
                    debug!(library = %library.title, count = paths.len(), "Sampled library paths");
                    samples.extend(paths);
                }
                Err(e) => {
                    warn!(library = %library.title, error = %e, "Failed to sample library");
                }
            }
        }
        Ok(samples)
    }

    /// Validates `paths`, or sampled library paths when none are given.
    pub async fn validate(
        &self,
        paths: Option<Vec<String>>,
    ) -> Result<ValidationReport, DiscoveryError> {
        let paths = match paths {
            Some(paths) => paths,
            None => self.sample_paths().await?,
        };
        let report = validate_paths(&self.mapper, &paths).await;
        info!(
            total = report.summary.total,
            passed = report.summary.passed,
            unmapped = report.summary.unmapped,
            "Path validation finished"
        );
        Ok(report)
    }

    /// Suggests mappings by matching sampled library paths against files
    /// under the configured local roots.
    pub async fn suggest(&self) -> Result<Vec<MappingSuggestion>, DiscoveryError> {
        let samples = self.sample_paths().await?;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let roots = self.config.local_roots.clone();
        let depth = self.config.scan_depth;
        let suggestions = tokio::task::spawn_blocking(move || suggest(&samples, &roots, depth))
            .await
            .map_err(|e| DiscoveryError::ScanFailed(e.to_string()))?;

        info!(count = suggestions.len(), "Mapping suggestions computed");
        Ok(suggestions)
    }
}
