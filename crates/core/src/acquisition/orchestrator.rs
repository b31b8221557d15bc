//! Subtitle acquisition orchestrator.
//!
//! One run per media item: resolve the local path, then walk the language
//! preference in order. Each language is searched, ranked, downloaded and
//! verified before the next one is considered; the first language that ends
//! up with a subtitle on disk ends the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::language::LanguageDetector;
use crate::metrics;
use crate::paths::PathMapper;
use crate::placer::{ExistingSubtitle, Placer};
use crate::provider::{ProviderQuery, SubtitleProvider};
use crate::release::{self, MatchTier, ReleaseSignature};

use super::config::AcquisitionConfig;
use super::retry::{download_with_retry, DownloadError, RetryPolicy};
use super::types::{
    rank_candidates, AcquisitionError, AcquisitionReport, AcquisitionStatus, LanguageOutcome,
    LanguageReport, MediaItem, NoSubtitleDetail, SubtitleCandidate,
};

/// Drives acquisition runs. Cheap to share; holds no per-run state.
pub struct AcquisitionOrchestrator {
    provider: Arc<dyn SubtitleProvider>,
    placer: Arc<dyn Placer>,
    mapper: Arc<PathMapper>,
    detector: LanguageDetector,
    config: AcquisitionConfig,
}

/// Per-language outcome, or an abort of the whole run.
enum Step {
    Finished(LanguageOutcome),
    Cancelled,
}

impl AcquisitionOrchestrator {
    pub fn new(
        provider: Arc<dyn SubtitleProvider>,
        placer: Arc<dyn Placer>,
        mapper: Arc<PathMapper>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            provider,
            placer,
            mapper,
            detector: LanguageDetector::new(),
            config,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Runs acquisition for `item`. Never fails: every outcome, including
    /// an unresolvable path, is part of the report.
    #[instrument(skip(self, item, cancel), fields(rating_key = %item.rating_key))]
    pub async fn run(&self, item: &MediaItem, cancel: &CancellationToken) -> AcquisitionReport {
        let started = Instant::now();
        let report = self.run_inner(item, cancel).await;

        let status = report.status.as_label();
        metrics::RUNS_TOTAL.with_label_values(&[status]).inc();
        metrics::RUN_DURATION
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());
        info!(
            title = %item.title,
            status = status,
            duration_ms = started.elapsed().as_millis() as u64,
            "Acquisition run finished"
        );
        report
    }

    async fn run_inner(&self, item: &MediaItem, cancel: &CancellationToken) -> AcquisitionReport {
        let (local_path, existing) = match self.resolve_target(item).await {
            Ok(target) => target,
            Err(e) => {
                warn!(remote_path = %item.remote_path, error = %e, "Cannot resolve local path");
                return AcquisitionReport {
                    status: AcquisitionStatus::PathUnresolvable {
                        reason: e.to_string(),
                    },
                    local_path: None,
                    languages: Vec::new(),
                };
            }
        };

        let signature = if self.config.use_release_matching {
            item.signature()
        } else {
            ReleaseSignature::default()
        };
        debug!(?signature, existing = existing.len(), "Starting language walk");

        let query = ProviderQuery {
            title: item.title.clone(),
            year: item.year,
            imdb_id: item.imdb_id.clone(),
            season: item.season,
            episode: item.episode,
            file_name: Some(item.file_name().to_string()),
        };

        let mut languages = Vec::new();
        for language in self.config.languages.iter() {
            if cancel.is_cancelled() {
                return cancelled(local_path, languages);
            }

            let current = existing.iter().find(|e| e.language == language);
            let outcome = match self
                .process_language(&local_path, language, &query, &signature, current, cancel)
                .await
            {
                Step::Finished(outcome) => outcome,
                Step::Cancelled => return cancelled(local_path, languages),
            };

            metrics::LANGUAGE_OUTCOMES
                .with_label_values(&[language, outcome.as_label()])
                .inc();
            info!(language = %language, outcome = outcome.as_label(), "Language finished");

            let satisfied = outcome.is_satisfied();
            languages.push(LanguageReport {
                language: language.to_string(),
                outcome,
            });
            if satisfied {
                break;
            }
        }

        let status = if languages.iter().any(|l| l.outcome.is_fresh()) {
            AcquisitionStatus::Done
        } else if languages.iter().any(|l| l.outcome.is_satisfied()) {
            AcquisitionStatus::AlreadySatisfied
        } else {
            AcquisitionStatus::NoSubtitleFound {
                detail: NoSubtitleDetail::from_outcomes(languages.iter().map(|l| &l.outcome)),
            }
        };

        AcquisitionReport {
            status,
            local_path: Some(local_path),
            languages,
        }
    }

    /// Local media path plus the subtitles already next to it.
    async fn resolve_target(
        &self,
        item: &MediaItem,
    ) -> Result<(PathBuf, Vec<ExistingSubtitle>), AcquisitionError> {
        let local = self.mapper.resolve(&item.remote_path)?;
        let languages: Vec<String> = self.config.languages.iter().map(String::from).collect();
        let existing = self.placer.existing(&local, &languages).await?;
        Ok((local, existing))
    }

    fn matching_active(&self, signature: &ReleaseSignature) -> bool {
        self.config.use_release_matching && !signature.is_empty()
    }

    async fn process_language(
        &self,
        local_path: &Path,
        language: &str,
        query: &ProviderQuery,
        signature: &ReleaseSignature,
        existing: Option<&ExistingSubtitle>,
        cancel: &CancellationToken,
    ) -> Step {
        let matching = self.matching_active(signature);

        if let Some(existing) = existing {
            // Without a way to recognise a perfect match there is nothing to
            // upgrade to; a perfect subtitle cannot be improved on.
            if !self.config.upgrade_on_perfect_match || !matching || existing.perfect {
                debug!(language = %language, path = %existing.path.display(), "Keeping existing subtitle");
                return Step::Finished(LanguageOutcome::KeptExisting {
                    path: existing.path.clone(),
                });
            }
        }

        let results = match self.provider.search(query, language).await {
            Ok(results) => {
                metrics::PROVIDER_SEARCHES
                    .with_label_values(&[self.provider.name(), "success"])
                    .inc();
                results
            }
            Err(e) => {
                metrics::PROVIDER_SEARCHES
                    .with_label_values(&[self.provider.name(), "error"])
                    .inc();
                warn!(language = %language, error = %e, "Provider search failed");
                return Step::Finished(match existing {
                    Some(existing) => LanguageOutcome::KeptExisting {
                        path: existing.path.clone(),
                    },
                    None => LanguageOutcome::SearchFailed {
                        error: e.to_string(),
                    },
                });
            }
        };

        let mut candidates: Vec<SubtitleCandidate> = results
            .into_iter()
            .map(|result| {
                let score = matching.then(|| {
                    let theirs = ReleaseSignature::parse_either(&result.release, &result.file_name);
                    release::score(&theirs, signature)
                });
                SubtitleCandidate {
                    result,
                    score,
                    verified: false,
                }
            })
            .filter(|c| !matching || c.tier() > MatchTier::None)
            .collect();
        rank_candidates(&mut candidates);
        metrics::CANDIDATES_FOUND.observe(candidates.len() as f64);

        // Upgrade gate: only a perfect match may replace an existing file.
        if let Some(existing) = existing {
            candidates.retain(SubtitleCandidate::is_perfect);
            if candidates.is_empty() {
                debug!(language = %language, "No perfect match, keeping existing subtitle");
                return Step::Finished(LanguageOutcome::KeptExisting {
                    path: existing.path.clone(),
                });
            }
        }

        if candidates.is_empty() {
            return Step::Finished(LanguageOutcome::NoCandidates);
        }

        self.try_candidates(local_path, language, candidates, existing, cancel)
            .await
    }

    /// Downloads and verifies candidates best first until one is placed.
    async fn try_candidates(
        &self,
        local_path: &Path,
        language: &str,
        candidates: Vec<SubtitleCandidate>,
        existing: Option<&ExistingSubtitle>,
        cancel: &CancellationToken,
    ) -> Step {
        let policy = RetryPolicy::from(&self.config);
        let mut rejected = 0usize;
        let mut last_error = None;

        for mut candidate in candidates {
            let id = candidate.result.id.clone();
            debug!(language = %language, id = %id, tier = %candidate.tier(), "Trying candidate");

            let content =
                match download_with_retry(self.provider.as_ref(), &id, policy, cancel).await {
                    Ok(content) => content,
                    Err(DownloadError::Cancelled) => return Step::Cancelled,
                    Err(DownloadError::Failed(attempt)) => {
                        last_error = attempt.last_error.map(|e| e.to_string());
                        continue;
                    }
                };

            let staged = match self
                .placer
                .stage(local_path, language, candidate.format(), &content)
                .await
            {
                Ok(staged) => staged,
                Err(e) => {
                    // The directory is not writable; other candidates would fail the same way.
                    warn!(language = %language, error = %e, "Failed to stage subtitle");
                    return Step::Finished(LanguageOutcome::DownloadFailed {
                        last_error: e.to_string(),
                    });
                }
            };

            let text = decode_subtitle(&content);
            candidate.verified = self.detector.verify(&text, language);
            if !candidate.verified {
                rejected += 1;
                metrics::VERIFICATION_REJECTIONS
                    .with_label_values(&[language])
                    .inc();
                warn!(language = %language, id = %id, "Downloaded subtitle failed language verification");
                self.placer.discard(staged).await;
                continue;
            }

            let perfect = candidate.is_perfect();
            return match self.placer.commit(staged, existing, perfect).await {
                Ok(placed) => Step::Finished(match existing {
                    Some(old) => LanguageOutcome::Upgraded {
                        path: placed.path,
                        replaced: old.path.clone(),
                        provider_id: id,
                    },
                    None => LanguageOutcome::Downloaded {
                        path: placed.path,
                        tier: candidate.tier(),
                        provider_id: id,
                    },
                }),
                Err(e) => {
                    warn!(language = %language, error = %e, "Failed to place subtitle");
                    Step::Finished(LanguageOutcome::DownloadFailed {
                        last_error: e.to_string(),
                    })
                }
            };
        }

        Step::Finished(if rejected > 0 {
            LanguageOutcome::VerificationRejected { rejected }
        } else {
            LanguageOutcome::DownloadFailed {
                last_error: last_error.unwrap_or_else(|| "download failed".to_string()),
            }
        })
    }
}

fn cancelled(local_path: PathBuf, languages: Vec<LanguageReport>) -> AcquisitionReport {
    AcquisitionReport {
        status: AcquisitionStatus::Cancelled,
        local_path: Some(local_path),
        languages,
    }
}

/// Decodes subtitle bytes: UTF-8 (with or without BOM), UTF-16 with BOM,
/// otherwise Latin-1.
fn decode_subtitle(bytes: &[u8]) -> String {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        },
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
