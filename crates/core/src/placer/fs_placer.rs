//! File system placer implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::PlacerError;
use super::traits::Placer;
use super::types::{ExistingSubtitle, PlacedSubtitle, StagedSubtitle};
use crate::language;

/// Sidecar formats the player picks up, in lookup order.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt"];

/// Final path for a subtitle of `media` in `code` with extension `format`.
pub fn subtitle_path(media: &Path, code: &str, format: &str) -> Option<PathBuf> {
    let stem = media.file_stem()?.to_str()?;
    let dir = media.parent()?;
    Some(dir.join(format!("{}.{}.{}", stem, code, format)))
}

/// Hidden marker recording that `subtitle` came from a perfect match.
pub fn marker_path(subtitle: &Path) -> Option<PathBuf> {
    let name = subtitle.file_name()?.to_str()?;
    Some(subtitle.with_file_name(format!(".{}.perfect", name)))
}

/// File system based placer implementation.
#[derive(Debug, Default)]
pub struct FsPlacer;

impl FsPlacer {
    pub fn new() -> Self {
        Self
    }

    async fn exists(path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Removes a file that may not exist.
    async fn remove_if_present(path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
        }
    }

    async fn write_temp(path: &Path, content: &[u8]) -> Result<(), PlacerError> {
        let mut file = File::create(path)
            .await
            .map_err(|e| PlacerError::write_failed(path.to_path_buf(), e))?;
        file.write_all(content)
            .await
            .map_err(|e| PlacerError::write_failed(path.to_path_buf(), e))?;
        file.sync_all()
            .await
            .map_err(|e| PlacerError::write_failed(path.to_path_buf(), e))?;
        Ok(())
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn existing(
        &self,
        media: &Path,
        languages: &[String],
    ) -> Result<Vec<ExistingSubtitle>, PlacerError> {
        let dir = media.parent().ok_or_else(|| PlacerError::InvalidMediaPath {
            path: media.to_path_buf(),
        })?;
        if !Self::exists(dir).await {
            return Err(PlacerError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut found = Vec::new();
        for code in languages {
            let aliases: Vec<&str> = match language::lookup(code) {
                Some(lang) => lang.aliases(),
                None => vec![code.as_str()],
            };

            'language: for alias in aliases {
                for ext in SUBTITLE_EXTENSIONS {
                    let Some(path) = subtitle_path(media, alias, ext) else {
                        return Err(PlacerError::InvalidMediaPath {
                            path: media.to_path_buf(),
                        });
                    };
                    if Self::exists(&path).await {
                        let perfect = match marker_path(&path) {
                            Some(marker) => Self::exists(&marker).await,
                            None => false,
                        };
                        found.push(ExistingSubtitle {
                            language: code.clone(),
                            path,
                            perfect,
                        });
                        break 'language;
                    }
                }
            }
        }
        Ok(found)
    }

    async fn stage(
        &self,
        media: &Path,
        language: &str,
        format: &str,
        content: &[u8],
    ) -> Result<StagedSubtitle, PlacerError> {
        let target = subtitle_path(media, language, format).ok_or_else(|| {
            PlacerError::InvalidMediaPath {
                path: media.to_path_buf(),
            }
        })?;
        let dir = target.parent().unwrap_or(Path::new("."));
        if !Self::exists(dir).await {
            return Err(PlacerError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let temp_path = dir.join(format!(".plexsubs-{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = Self::write_temp(&temp_path, content).await {
            Self::remove_if_present(&temp_path).await;
            return Err(e);
        }

        let checksum = format!("{:x}", Sha256::digest(content));
        debug!(temp = %temp_path.display(), target = %target.display(), bytes = content.len(), "Staged subtitle");

        Ok(StagedSubtitle {
            temp_path,
            target,
            language: language.to_string(),
            size_bytes: content.len() as u64,
            checksum,
        })
    }

    async fn commit(
        &self,
        staged: StagedSubtitle,
        replaces: Option<&ExistingSubtitle>,
        perfect: bool,
    ) -> Result<PlacedSubtitle, PlacerError> {
        // Same directory, so this is a rename and never a copy.
        if let Err(e) = fs::rename(&staged.temp_path, &staged.target).await {
            // The staged file is consumed here, so nobody else can clean it up.
            Self::remove_if_present(&staged.temp_path).await;
            return Err(PlacerError::move_failed(staged.temp_path, staged.target, e));
        }

        if let Some(marker) = marker_path(&staged.target) {
            if perfect {
                if let Err(e) = fs::write(&marker, staged.checksum.as_bytes()).await {
                    warn!(marker = %marker.display(), error = %e, "Failed to write match marker");
                }
            } else {
                Self::remove_if_present(&marker).await;
            }
        }

        let replaced = match replaces {
            Some(old) if old.path != staged.target => {
                Self::remove_if_present(&old.path).await;
                if let Some(marker) = marker_path(&old.path) {
                    Self::remove_if_present(&marker).await;
                }
                Some(old.path.clone())
            }
            _ => None,
        };

        info!(
            path = %staged.target.display(),
            language = %staged.language,
            perfect,
            "Placed subtitle"
        );

        Ok(PlacedSubtitle {
            path: staged.target,
            language: staged.language,
            size_bytes: staged.size_bytes,
            checksum: staged.checksum,
            perfect,
            replaced,
        })
    }

    async fn discard(&self, staged: StagedSubtitle) {
        Self::remove_if_present(&staged.temp_path).await;
    }
}
