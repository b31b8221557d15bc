//! Trait definitions for the placer module.

use std::path::Path;

use async_trait::async_trait;

use super::error::PlacerError;
use super::types::{ExistingSubtitle, PlacedSubtitle, StagedSubtitle};

/// Writes subtitles next to media files.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Subtitles already present for `media` in any of `languages`
    /// (ISO 639-1), at most one per language.
    async fn existing(
        &self,
        media: &Path,
        languages: &[String],
    ) -> Result<Vec<ExistingSubtitle>, PlacerError>;

    /// Writes `content` to a temporary file beside `media`. `format` is the
    /// subtitle extension (`srt`, `ass`, ...).
    async fn stage(
        &self,
        media: &Path,
        language: &str,
        format: &str,
        content: &[u8],
    ) -> Result<StagedSubtitle, PlacerError>;

    /// Moves a staged file to its final name, removing `replaces` if it
    /// lives under a different name.
    async fn commit(
        &self,
        staged: StagedSubtitle,
        replaces: Option<&ExistingSubtitle>,
        perfect: bool,
    ) -> Result<PlacedSubtitle, PlacerError>;

    /// Drops a staged file. Never fails; problems are logged.
    async fn discard(&self, staged: StagedSubtitle);
}
