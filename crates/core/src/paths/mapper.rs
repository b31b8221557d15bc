//! Remote-to-local path translation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// One prefix substitution rule: paths reported by Plex under `remote` live
/// under `local` on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathMapping {
    pub remote: String,
    pub local: String,
}

impl PathMapping {
    pub fn new(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
        }
    }

    /// Parses the compact `"/remote:/local,/other:/mnt/other"` form.
    ///
    /// Entries are split at the last `:/` so Windows drive letters on the
    /// remote side (`M:\Media:/mnt/media`) survive.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, PathMappingError> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let idx = entry
                    .rfind(":/")
                    .ok_or_else(|| PathMappingError::InvalidEntry(entry.to_string()))?;
                let (remote, local) = (&entry[..idx], &entry[idx + 1..]);
                if remote.is_empty() || local.is_empty() {
                    return Err(PathMappingError::InvalidEntry(entry.to_string()));
                }
                Ok(Self::new(remote, local))
            })
            .collect()
    }

    /// Returns the part of `path` below this mapping's remote prefix.
    ///
    /// Matches on whole path components: `/media` covers `/media/a.mkv`
    /// but not `/media2/a.mkv`.
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.remote.as_str())?;
        if rest.is_empty() || self.remote.ends_with(SEPARATORS) || rest.starts_with(SEPARATORS) {
            Some(rest)
        } else {
            None
        }
    }

    fn apply(&self, rest: &str) -> PathBuf {
        let windows_local = self.local.contains('\\') && !self.local.contains('/');
        let sep = if windows_local { '\\' } else { '/' };

        let base = self.local.trim_end_matches(SEPARATORS);
        let rest = rest.trim_start_matches(SEPARATORS);
        let rest: String = rest
            .chars()
            .map(|c| if SEPARATORS.contains(&c) { sep } else { c })
            .collect();

        match (base.is_empty(), rest.is_empty()) {
            (true, true) => PathBuf::from(sep.to_string()),
            (false, true) => PathBuf::from(base),
            (true, false) => PathBuf::from(format!("{sep}{rest}")),
            (false, false) => PathBuf::from(format!("{base}{sep}{rest}")),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathMappingError {
    #[error("No path mapping matches {0}")]
    NotMapped(String),

    #[error("Invalid path mapping entry: {0:?} (expected remote:local)")]
    InvalidEntry(String),
}

/// Ordered mapping table. The first rule whose remote prefix matches wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapper {
    mappings: Vec<PathMapping>,
}

impl PathMapper {
    pub fn new(mappings: Vec<PathMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[PathMapping] {
        &self.mappings
    }

    /// Translates a Plex-reported path to a local one. Pure: no filesystem access.
    pub fn resolve(&self, remote_path: &str) -> Result<PathBuf, PathMappingError> {
        self.mappings
            .iter()
            .find_map(|m| m.strip(remote_path).map(|rest| m.apply(rest)))
            .ok_or_else(|| PathMappingError::NotMapped(remote_path.to_string()))
    }

    /// Whether `remote`/`local` is already in the table (ignoring trailing separators).
    pub fn contains(&self, remote: &str, local: &str) -> bool {
        let norm = |s: &str| s.trim_end_matches(SEPARATORS).to_string();
        self.mappings
            .iter()
            .any(|m| norm(&m.remote) == norm(remote) && norm(&m.local) == norm(local))
    }
}
