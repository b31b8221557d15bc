//! Types for the placer module.

use serde::Serialize;
use std::path::PathBuf;

/// A subtitle file already next to the media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingSubtitle {
    /// ISO 639-1 code.
    pub language: String,
    pub path: PathBuf,
    /// Placed from a perfect release match.
    pub perfect: bool,
}

/// Content written to a temporary file, not yet visible under its final name.
#[derive(Debug, Clone)]
pub struct StagedSubtitle {
    pub temp_path: PathBuf,
    pub target: PathBuf,
    pub language: String,
    pub size_bytes: u64,
    /// SHA-256 of the content, hex encoded.
    pub checksum: String,
}

/// A subtitle committed to its final path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedSubtitle {
    pub path: PathBuf,
    pub language: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub perfect: bool,
    /// Previous subtitle removed because it had a different name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<PathBuf>,
}
