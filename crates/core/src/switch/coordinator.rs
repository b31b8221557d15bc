//! Playback switch coordinator.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::metrics;
use crate::player::{PlaybackSession, PlayerClient, SubtitleTrack};

use super::config::SwitchConfig;

/// The session to switch and what it looked like before the download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTarget {
    /// Player session id when the event carried one.
    pub session_id: Option<String>,
    pub rating_key: String,
    /// Subtitle stream ids known before the new file was placed.
    pub known_tracks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveUpReason {
    /// The session stopped or moved to another item.
    SessionEnded,
    /// The player never listed a stream in the language.
    TrackNeverAppeared,
    /// The stream appeared but selecting it did not stick.
    SelectionNotApplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SwitchOutcome {
    Switched { track_id: String, attempts: u32 },
    GaveUp { reason: GiveUpReason, attempts: u32 },
    Cancelled,
}

impl SwitchOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Switched { .. } => "switched",
            Self::GaveUp {
                reason: GiveUpReason::SessionEnded,
                ..
            } => "session_ended",
            Self::GaveUp {
                reason: GiveUpReason::TrackNeverAppeared,
                ..
            } => "track_never_appeared",
            Self::GaveUp {
                reason: GiveUpReason::SelectionNotApplied,
                ..
            } => "selection_not_applied",
            Self::Cancelled => "cancelled",
        }
    }
}

pub struct PlaybackSwitchCoordinator {
    player: Arc<dyn PlayerClient>,
    config: SwitchConfig,
}

impl PlaybackSwitchCoordinator {
    pub fn new(player: Arc<dyn PlayerClient>, config: SwitchConfig) -> Self {
        Self { player, config }
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Polls the session until a stream in `language` can be selected and
    /// the player reports it selected, or the timeout passes. Returns as
    /// soon as `cancel` fires.
    #[instrument(skip(self, target, cancel), fields(rating_key = %target.rating_key))]
    pub async fn attempt_switch(
        &self,
        target: &SwitchTarget,
        language: &str,
        cancel: &CancellationToken,
    ) -> SwitchOutcome {
        let started = Instant::now();
        let outcome = self.switch_loop(target, language, cancel).await;

        metrics::SWITCH_OUTCOMES
            .with_label_values(&[outcome.as_label()])
            .inc();
        metrics::SWITCH_DURATION
            .with_label_values(&[outcome.as_label()])
            .observe(started.elapsed().as_secs_f64());
        info!(language = %language, outcome = outcome.as_label(), "Live switch finished");
        outcome
    }

    async fn switch_loop(
        &self,
        target: &SwitchTarget,
        language: &str,
        cancel: &CancellationToken,
    ) -> SwitchOutcome {
        let deadline = Instant::now() + self.config.timeout();
        let interval = self.config.poll_interval();
        let mut attempts = 0u32;
        let mut track_seen = false;

        loop {
            if cancel.is_cancelled() {
                return SwitchOutcome::Cancelled;
            }

            match self.player.list_sessions().await {
                Ok(sessions) => {
                    let Some(session) = find_session(&sessions, target) else {
                        return SwitchOutcome::GaveUp {
                            reason: GiveUpReason::SessionEnded,
                            attempts,
                        };
                    };

                    if let Some(track) = pick_track(session, language, &target.known_tracks) {
                        track_seen = true;
                        if track.selected {
                            return SwitchOutcome::Switched {
                                track_id: track.id.clone(),
                                attempts,
                            };
                        }

                        attempts += 1;
                        debug!(track = %track.id, attempt = attempts, "Selecting subtitle track");
                        if let Err(e) = self.player.select_subtitle_track(session, &track.id).await
                        {
                            warn!(track = %track.id, error = %e, "Select command failed");
                        }
                    } else {
                        debug!(language = %language, "Track not listed yet");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to list sessions"),
            }

            if Instant::now() + interval > deadline {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => return SwitchOutcome::Cancelled,
                _ = sleep(interval) => {}
            }
        }

        SwitchOutcome::GaveUp {
            reason: if track_seen {
                GiveUpReason::SelectionNotApplied
            } else {
                GiveUpReason::TrackNeverAppeared
            },
            attempts,
        }
    }
}

/// The target's session, if it is still playing the same item.
fn find_session<'a>(
    sessions: &'a [PlaybackSession],
    target: &SwitchTarget,
) -> Option<&'a PlaybackSession> {
    sessions.iter().find(|s| {
        s.rating_key == target.rating_key
            && target
                .session_id
                .as_ref()
                .map_or(true, |id| *id == s.session_id)
    })
}

/// Sidecar stream in `language`, preferring one that was not there before.
fn pick_track<'a>(
    session: &'a PlaybackSession,
    language: &str,
    known: &[String],
) -> Option<&'a SubtitleTrack> {
    let mut candidates = session
        .subtitle_tracks
        .iter()
        .filter(|t| t.external && t.is_language(language));
    let first = candidates.clone().next();
    candidates.find(|t| !known.contains(&t.id)).or(first)
}
