//! Filesystem probing of mapped paths.

use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::mapper::PathMapper;

/// Result of probing one remote path through the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCheck {
    pub remote: String,
    /// `None` when no mapping matched.
    pub local: Option<PathBuf>,
    pub exists: bool,
    pub readable: bool,
    /// Whether a subtitle could be written next to the file (or inside the directory).
    pub writable: bool,
    pub is_file: bool,
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PathCheck {
    pub fn passed(&self) -> bool {
        self.exists && self.readable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub unmapped: usize,
    pub accessible: usize,
    pub readable: usize,
    pub writable: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub checks: Vec<PathCheck>,
    pub summary: ValidationSummary,
    pub hints: Vec<String>,
}

impl ValidationReport {
    fn from_checks(checks: Vec<PathCheck>) -> Self {
        let summary = ValidationSummary {
            total: checks.len(),
            passed: checks.iter().filter(|p| p.passed()).count(),
            failed: checks.iter().filter(|p| !p.passed()).count(),
            unmapped: checks.iter().filter(|p| p.local.is_none()).count(),
            accessible: checks.iter().filter(|p| p.exists).count(),
            readable: checks.iter().filter(|p| p.readable).count(),
            writable: checks.iter().filter(|p| p.writable).count(),
        };
        let hints = hints_for(&checks);
        Self {
            valid: summary.total > 0 && summary.failed == 0,
            checks,
            summary,
            hints,
        }
    }
}

/// Resolves and checks every path. Missing or unmapped paths are reported in
/// the result, never returned as errors.
pub async fn validate_paths(mapper: &PathMapper, remote_paths: &[String]) -> ValidationReport {
    if remote_paths.is_empty() {
        return ValidationReport {
            valid: false,
            checks: Vec::new(),
            summary: ValidationSummary::default(),
            hints: vec![
                "No media files found to test. Add media to your Plex libraries or set discovery.test_file."
                    .to_string(),
            ],
        };
    }

    let checks = join_all(remote_paths.iter().map(|p| check_path(mapper, p))).await;
    ValidationReport::from_checks(checks)
}

async fn check_path(mapper: &PathMapper, remote: &str) -> PathCheck {
    let mut check = PathCheck {
        remote: remote.to_string(),
        local: None,
        exists: false,
        readable: false,
        writable: false,
        is_file: false,
        is_directory: false,
        error: None,
    };

    let local = match mapper.resolve(remote) {
        Ok(local) => local,
        Err(e) => {
            check.error = Some(e.to_string());
            return check;
        }
    };
    check.local = Some(local.clone());

    let metadata = match fs::metadata(&local).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            check.error = Some(format!("Path does not exist: {}", local.display()));
            return check;
        }
        Err(e) => {
            check.error = Some(format!("Cannot stat {}: {}", local.display(), e));
            return check;
        }
    };

    check.exists = true;
    check.is_file = metadata.is_file();
    check.is_directory = metadata.is_dir();
    check.readable = if check.is_directory {
        fs::read_dir(&local).await.is_ok()
    } else {
        fs::File::open(&local).await.is_ok()
    };

    let dir = if check.is_directory {
        Some(local.as_path())
    } else {
        local.parent()
    };
    check.writable = match dir {
        Some(dir) => can_write_in(dir).await,
        None => false,
    };

    check
}

/// Creates and removes a marker file in `dir`.
async fn can_write_in(dir: &Path) -> bool {
    let marker = dir.join(format!(".plexsubs-write-test-{}", uuid::Uuid::new_v4()));
    match fs::write(&marker, b"").await {
        Ok(()) => {
            if let Err(e) = fs::remove_file(&marker).await {
                debug!(path = %marker.display(), error = %e, "Failed to remove write marker");
            }
            true
        }
        Err(_) => false,
    }
}

fn hints_for(checks: &[PathCheck]) -> Vec<String> {
    let mut hints = Vec::new();

    let unmapped: Vec<_> = checks.iter().filter(|p| p.local.is_none()).collect();
    let missing: Vec<_> = checks
        .iter()
        .filter(|p| p.local.is_some() && !p.exists)
        .collect();
    let unreadable = checks.iter().any(|p| p.exists && !p.readable);
    let unwritable = checks.iter().any(|p| p.exists && !p.writable);

    if !unmapped.is_empty() || !missing.is_empty() {
        let mut prefixes: Vec<String> = unmapped
            .iter()
            .chain(missing.iter())
            .filter_map(|p| root_prefix(&p.remote))
            .collect();
        prefixes.sort();
        prefixes.dedup();
        hints.push(format!(
            "Mapped paths not found. Plex uses these prefixes: {}. Check your path_mappings.",
            prefixes.join(", ")
        ));
        if Path::new("/.dockerenv").exists() {
            hints.push(
                "Running in a container: make sure the media volume is mounted and matches path_mappings."
                    .to_string(),
            );
        }
    }
    if unreadable {
        hints.push("Some media files are not readable. Check file permissions.".to_string());
    }
    if unwritable {
        hints.push(
            "Some media directories are not writable. Subtitle downloads will fail there."
                .to_string(),
        );
    }
    if !checks.is_empty() && checks.iter().all(PathCheck::passed) {
        hints.push("All path mappings are working.".to_string());
    }

    hints
}

/// First component of a remote path: `/media` or `M:`.
fn root_prefix(remote: &str) -> Option<String> {
    if let Some(rest) = remote.strip_prefix('/') {
        rest.split('/')
            .find(|s| !s.is_empty())
            .map(|first| format!("/{first}"))
    } else {
        remote
            .split_once(':')
            .map(|(drive, _)| format!("{drive}:"))
    }
}
