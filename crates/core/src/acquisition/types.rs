//! Types for the acquisition module.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::paths::PathMappingError;
use crate::placer::PlacerError;
use crate::provider::ProviderResult;
use crate::release::{MatchScore, MatchTier, ReleaseSignature};

/// One playable file, as reported by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub rating_key: String,
    pub title: String,
    pub year: Option<u32>,
    pub imdb_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Absolute path as the player sees it.
    pub remote_path: String,
}

impl MediaItem {
    /// File name part of the remote path.
    pub fn file_name(&self) -> &str {
        self.remote_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.remote_path)
    }

    pub fn signature(&self) -> ReleaseSignature {
        ReleaseSignature::parse(self.file_name())
    }
}

/// A provider result with its match against the media file.
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleCandidate {
    pub result: ProviderResult,
    /// `None` when release matching is off or the media has no signature.
    pub score: Option<MatchScore>,
    /// Set once the downloaded text passed language verification.
    pub verified: bool,
}

impl SubtitleCandidate {
    pub fn tier(&self) -> MatchTier {
        self.score.map(|s| s.tier).unwrap_or(MatchTier::None)
    }

    pub fn is_perfect(&self) -> bool {
        self.tier() == MatchTier::Perfect
    }

    /// Extension for the placed file, from the provider's file name.
    pub fn format(&self) -> &'static str {
        let ext = self
            .result
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("ass") => "ass",
            Some("ssa") => "ssa",
            Some("vtt") => "vtt",
            _ => "srt",
        }
    }
}

/// Orders candidates best first: by tier, then by download count when the
/// provider reports one. Equal candidates keep their received order.
pub fn rank_candidates(candidates: &mut [SubtitleCandidate]) {
    candidates.sort_by(|a, b| {
        b.tier()
            .cmp(&a.tier())
            .then_with(|| b.result.download_count.cmp(&a.result.download_count))
    });
}

/// What happened for one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LanguageOutcome {
    /// New subtitle placed where none existed.
    Downloaded {
        path: PathBuf,
        tier: MatchTier,
        provider_id: String,
    },
    /// Existing subtitle replaced by a perfect match.
    Upgraded {
        path: PathBuf,
        replaced: PathBuf,
        provider_id: String,
    },
    /// Existing subtitle left in place.
    KeptExisting { path: PathBuf },
    /// Provider had nothing usable.
    NoCandidates,
    /// Candidates downloaded but none passed language verification.
    VerificationRejected { rejected: usize },
    /// Every candidate failed to download.
    DownloadFailed { last_error: String },
    /// The search itself failed.
    SearchFailed { error: String },
}

impl LanguageOutcome {
    /// Whether a subtitle in this language is on disk afterwards.
    pub fn is_satisfied(&self) -> bool {
        matches!(
            self,
            Self::Downloaded { .. } | Self::Upgraded { .. } | Self::KeptExisting { .. }
        )
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Downloaded { .. } | Self::Upgraded { .. })
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Downloaded { .. } => "downloaded",
            Self::Upgraded { .. } => "upgraded",
            Self::KeptExisting { .. } => "kept_existing",
            Self::NoCandidates => "no_candidates",
            Self::VerificationRejected { .. } => "verification_rejected",
            Self::DownloadFailed { .. } => "download_failed",
            Self::SearchFailed { .. } => "search_failed",
        }
    }

    pub fn placed_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Downloaded { path, .. } | Self::Upgraded { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageReport {
    pub language: String,
    #[serde(flatten)]
    pub outcome: LanguageOutcome,
}

/// Why no language could be satisfied, as precisely as the run can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSubtitleDetail {
    /// No candidate in any language.
    NoCandidates,
    /// Something was found, but language verification rejected it.
    VerificationRejected,
    /// Something was found, but downloads failed.
    DownloadFailed,
    /// The provider could not be searched.
    ProviderUnavailable,
}

impl NoSubtitleDetail {
    /// Most informative detail across the languages tried.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a LanguageOutcome>) -> Self {
        let mut detail = Self::NoCandidates;
        for outcome in outcomes {
            let this = match outcome {
                LanguageOutcome::VerificationRejected { .. } => Self::VerificationRejected,
                LanguageOutcome::DownloadFailed { .. } => Self::DownloadFailed,
                LanguageOutcome::SearchFailed { .. } => Self::ProviderUnavailable,
                _ => continue,
            };
            if this.precedence() > detail.precedence() {
                detail = this;
            }
        }
        detail
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::NoCandidates => 0,
            Self::ProviderUnavailable => 1,
            Self::DownloadFailed => 2,
            Self::VerificationRejected => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquisitionStatus {
    /// At least one language got a new or upgraded subtitle.
    Done,
    /// Existing subtitles were kept, nothing downloaded.
    AlreadySatisfied,
    /// No local path for the media file; nothing was searched.
    PathUnresolvable { reason: String },
    NoSubtitleFound { detail: NoSubtitleDetail },
    /// Aborted by shutdown.
    Cancelled,
}

impl AcquisitionStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::AlreadySatisfied => "already_satisfied",
            Self::PathUnresolvable { .. } => "path_unresolvable",
            Self::NoSubtitleFound { .. } => "no_subtitle_found",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result of one acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionReport {
    #[serde(flatten)]
    pub status: AcquisitionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    pub languages: Vec<LanguageReport>,
}

impl AcquisitionReport {
    /// Languages that got a new file in this run.
    pub fn fresh_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .filter(|l| l.outcome.is_fresh())
            .map(|l| l.language.as_str())
    }
}

/// Errors that abort one language's processing.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Path mapping failed: {0}")]
    Path(#[from] PathMappingError),

    #[error("Placement failed: {0}")]
    Placer(#[from] PlacerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, tier: Option<MatchTier>, downloads: Option<u64>) -> SubtitleCandidate {
        SubtitleCandidate {
            result: ProviderResult {
                id: id.to_string(),
                language: "en".to_string(),
                release: String::new(),
                file_name: format!("{}.srt", id),
                download_count: downloads,
            },
            score: tier.map(|tier| MatchScore { tier, score: 0.5 }),
            verified: false,
        }
    }

    #[test]
    fn test_rank_by_tier_then_popularity() {
        let mut list = vec![
            candidate("weak", Some(MatchTier::Weak), Some(9000)),
            candidate("good-low", Some(MatchTier::Good), Some(10)),
            candidate("perfect", Some(MatchTier::Perfect), Some(1)),
            candidate("good-high", Some(MatchTier::Good), Some(500)),
        ];
        rank_candidates(&mut list);
        let ids: Vec<_> = list.iter().map(|c| c.result.id.as_str()).collect();
        assert_eq!(ids, vec!["perfect", "good-high", "good-low", "weak"]);
    }

    #[test]
    fn test_rank_keeps_received_order_without_signal() {
        let mut list = vec![
            candidate("a", None, None),
            candidate("b", None, None),
            candidate("c", None, None),
        ];
        rank_candidates(&mut list);
        let ids: Vec<_> = list.iter().map(|c| c.result.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_candidate_format() {
        let mut c = candidate("x", None, None);
        assert_eq!(c.format(), "srt");
        c.result.file_name = "Movie.ASS".to_string();
        assert_eq!(c.format(), "ass");
        c.result.file_name = "noext".to_string();
        assert_eq!(c.format(), "srt");
    }

    #[test]
    fn test_media_item_file_name() {
        let item = MediaItem {
            rating_key: "1".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            imdb_id: None,
            season: None,
            episode: None,
            remote_path: "D:\\Movies\\Heat.1995.1080p.BluRay.x264-AMIABLE.mkv".to_string(),
        };
        assert_eq!(item.file_name(), "Heat.1995.1080p.BluRay.x264-AMIABLE.mkv");
        assert_eq!(item.signature().group.as_deref(), Some("AMIABLE"));
    }

    #[test]
    fn test_no_subtitle_detail_prefers_verification() {
        let outcomes = vec![
            LanguageOutcome::NoCandidates,
            LanguageOutcome::VerificationRejected { rejected: 2 },
            LanguageOutcome::DownloadFailed { last_error: "timeout".into() },
        ];
        assert_eq!(
            NoSubtitleDetail::from_outcomes(&outcomes),
            NoSubtitleDetail::VerificationRejected
        );
        assert_eq!(
            NoSubtitleDetail::from_outcomes(&[LanguageOutcome::NoCandidates]),
            NoSubtitleDetail::NoCandidates
        );
    }

    #[test]
    fn test_outcome_flags() {
        let kept = LanguageOutcome::KeptExisting { path: PathBuf::from("/a.en.srt") };
        assert!(kept.is_satisfied());
        assert!(!kept.is_fresh());
        assert!(!LanguageOutcome::NoCandidates.is_satisfied());
    }
}
