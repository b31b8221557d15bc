//! Service facade: one call per "media started" event.
//!
//! Fetches the item from the player, runs acquisition, asks the player to
//! rescan and then tries the live switch. Everything the run did ends up in
//! the returned `RunReport`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::acquisition::{AcquisitionOrchestrator, AcquisitionReport, AcquisitionStatus, MediaItem};
use crate::config::Config;
use crate::paths::PathMapper;
use crate::placer::Placer;
use crate::player::{MediaMetadata, PlayerClient, PlayerError};
use crate::provider::SubtitleProvider;
use crate::switch::{PlaybackSwitchCoordinator, SwitchOutcome, SwitchTarget};

/// A playback start, as delivered by the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaStarted {
    pub rating_key: String,
    pub session_id: Option<String>,
    /// Player name for logging.
    pub player: Option<String>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Player unavailable: {0}")]
    Player(#[from] PlayerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchSkipReason {
    NothingDownloaded,
    AutoSelectDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwitchStatus {
    NotAttempted {
        reason: SwitchSkipReason,
    },
    Attempted {
        language: String,
        outcome: SwitchOutcome,
        /// Whether the item's default stream was set after giving up.
        #[serde(skip_serializing_if = "Option::is_none")]
        default_set: Option<bool>,
    },
}

/// Everything one event produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub rating_key: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub acquisition: AcquisitionReport,
    pub switch: SwitchStatus,
}

pub struct SubtitleService {
    player: Arc<dyn PlayerClient>,
    orchestrator: AcquisitionOrchestrator,
    switcher: PlaybackSwitchCoordinator,
}

impl SubtitleService {
    pub fn new(
        player: Arc<dyn PlayerClient>,
        provider: Arc<dyn SubtitleProvider>,
        placer: Arc<dyn Placer>,
        mapper: Arc<PathMapper>,
        config: &Config,
    ) -> Self {
        let orchestrator =
            AcquisitionOrchestrator::new(provider, placer, mapper, config.subtitles.clone());
        let switcher = PlaybackSwitchCoordinator::new(player.clone(), config.switch.clone());
        Self {
            player,
            orchestrator,
            switcher,
        }
    }

    /// Handles one playback start. Fails only when the player cannot
    /// describe the item; every other outcome is in the report.
    pub async fn handle_media_started(
        &self,
        event: &MediaStarted,
        cancel: &CancellationToken,
    ) -> Result<RunReport, ServiceError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            rating_key = %event.rating_key,
            player = event.player.as_deref().unwrap_or("unknown"),
            "Media started"
        );

        let metadata = self.player.item_metadata(&event.rating_key).await?;
        let known_tracks: Vec<String> =
            metadata.subtitle_tracks.iter().map(|t| t.id.clone()).collect();

        let acquisition = match media_item(&metadata) {
            Some(item) => self.orchestrator.run(&item, cancel).await,
            None => AcquisitionReport {
                status: AcquisitionStatus::PathUnresolvable {
                    reason: "player reported no file for this item".to_string(),
                },
                local_path: None,
                languages: Vec::new(),
            },
        };

        let switch = self
            .switch_after(event, &acquisition, known_tracks, cancel)
            .await;

        Ok(RunReport {
            run_id,
            rating_key: metadata.rating_key,
            title: metadata.title,
            started_at,
            finished_at: Utc::now(),
            acquisition,
            switch,
        })
    }

    async fn switch_after(
        &self,
        event: &MediaStarted,
        acquisition: &AcquisitionReport,
        known_tracks: Vec<String>,
        cancel: &CancellationToken,
    ) -> SwitchStatus {
        let Some(language) = acquisition.fresh_languages().next().map(String::from) else {
            return SwitchStatus::NotAttempted {
                reason: SwitchSkipReason::NothingDownloaded,
            };
        };

        if let Err(e) = self.player.refresh_item(&event.rating_key).await {
            warn!(rating_key = %event.rating_key, error = %e, "Failed to refresh item");
        }

        if !self.orchestrator.config().auto_select {
            return SwitchStatus::NotAttempted {
                reason: SwitchSkipReason::AutoSelectDisabled,
            };
        }

        let target = SwitchTarget {
            session_id: event.session_id.clone(),
            rating_key: event.rating_key.clone(),
            known_tracks,
        };
        let outcome = self.switcher.attempt_switch(&target, &language, cancel).await;

        let default_set = match outcome {
            SwitchOutcome::GaveUp { .. } if self.switcher.config().set_default_on_give_up => {
                match self
                    .player
                    .set_default_subtitle(&event.rating_key, &language)
                    .await
                {
                    Ok(set) => Some(set),
                    Err(e) => {
                        warn!(rating_key = %event.rating_key, error = %e, "Failed to set default subtitle");
                        Some(false)
                    }
                }
            }
            _ => None,
        };

        SwitchStatus::Attempted {
            language,
            outcome,
            default_set,
        }
    }
}

fn media_item(metadata: &MediaMetadata) -> Option<MediaItem> {
    Some(MediaItem {
        rating_key: metadata.rating_key.clone(),
        title: metadata
            .show_title
            .clone()
            .unwrap_or_else(|| metadata.title.clone()),
        year: metadata.year,
        imdb_id: metadata.imdb_id.clone(),
        season: metadata.season,
        episode: metadata.episode,
        remote_path: metadata.file_path.clone()?,
    })
}
