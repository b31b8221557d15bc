//! Mapping suggestions derived from matching path suffixes.
//!
//! A Plex path `/media/movies/Heat/Heat.mkv` and a local file
//! `/mnt/library/movies/Heat/Heat.mkv` share the suffix `movies/Heat/Heat.mkv`,
//! which implies the mapping `/media -> /mnt/library`. Every sample that
//! implies the same pair corroborates it.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::mapper::PathMapper;

/// Hard cap on indexed files so a huge mount cannot stall discovery.
const MAX_INDEXED_FILES: usize = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSuggestion {
    pub remote: String,
    pub local: String,
    /// Number of distinct samples implying this pair.
    pub corroborating_samples: usize,
    pub confidence: Confidence,
    /// One remote sample that produced the pair.
    pub example: String,
}

impl MappingSuggestion {
    pub fn is_configured(&self, mapper: &PathMapper) -> bool {
        mapper.contains(&self.remote, &self.local)
    }
}

/// File-name index over the local library roots.
#[derive(Debug, Clone, Default)]
pub struct LocalIndex {
    by_name: HashMap<String, Vec<PathBuf>>,
}

impl LocalIndex {
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut index = Self::default();
        for path in paths {
            index.insert(path);
        }
        index
    }

    fn insert(&mut self, path: PathBuf) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.by_name.entry(name.to_string()).or_default().push(path);
        }
    }

    /// Walks `roots` up to `max_depth` directory levels below each root,
    /// skipping hidden entries. The roots themselves may be hidden.
    /// Blocking: call from `spawn_blocking` in async contexts.
    pub fn scan(roots: &[PathBuf], max_depth: usize) -> Self {
        let mut index = Self::default();
        let mut count = 0usize;

        for root in roots {
            let entries = WalkDir::new(root)
                .max_depth(max_depth + 1)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                        None
                    }
                });

            for entry in entries {
                if !entry.file_type().is_file() {
                    continue;
                }
                index.insert(entry.into_path());
                count += 1;
                if count >= MAX_INDEXED_FILES {
                    debug!(count, "Local index limit reached");
                    return index;
                }
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn matches(&self, file_name: &str) -> &[PathBuf] {
        self.by_name
            .get(file_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Ranks candidate mappings implied by `remote_samples` found in `index`.
///
/// Ordered by corroborating samples (descending), then by the shorter remote
/// prefix, then the shorter local prefix.
pub fn suggest_mappings(remote_samples: &[String], index: &LocalIndex) -> Vec<MappingSuggestion> {
    let mut tally: HashMap<(String, String), (usize, String)> = HashMap::new();

    for sample in remote_samples {
        let remote_parts = split_remote(sample);
        let Some(file_name) = remote_parts.last() else {
            continue;
        };

        let mut seen = HashSet::new();
        for local in index.matches(file_name) {
            let local_parts = local_components(local);
            let shared = common_suffix_len(&remote_parts, &local_parts);
            if shared == 0 {
                continue;
            }
            let Some(local_prefix) = local.ancestors().nth(shared) else {
                continue;
            };
            let remote_prefix = join_remote(sample, &remote_parts[..remote_parts.len() - shared]);
            let pair = (remote_prefix, local_prefix.to_string_lossy().to_string());
            if seen.insert(pair.clone()) {
                tally
                    .entry(pair)
                    .or_insert_with(|| (0, sample.clone()))
                    .0 += 1;
            }
        }
    }

    let samples = remote_samples.len().max(1);
    let mut suggestions: Vec<MappingSuggestion> = tally
        .into_iter()
        .map(|((remote, local), (count, example))| MappingSuggestion {
            remote,
            local,
            corroborating_samples: count,
            confidence: if count == samples {
                Confidence::High
            } else if count * 2 >= samples {
                Confidence::Medium
            } else {
                Confidence::Low
            },
            example,
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.corroborating_samples
            .cmp(&a.corroborating_samples)
            .then(a.remote.len().cmp(&b.remote.len()))
            .then(a.local.len().cmp(&b.local.len()))
            .then_with(|| a.remote.cmp(&b.remote))
            .then_with(|| a.local.cmp(&b.local))
    });
    suggestions
}

/// Scans `local_roots` and suggests mappings for `remote_samples`.
pub fn suggest(
    remote_samples: &[String],
    local_roots: &[PathBuf],
    max_depth: usize,
) -> Vec<MappingSuggestion> {
    let index = LocalIndex::scan(local_roots, max_depth);
    suggest_mappings(remote_samples, &index)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn split_remote(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

fn join_remote(original: &str, parts: &[&str]) -> String {
    if original.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("\\")
    }
}

fn local_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}

fn common_suffix_len(remote: &[&str], local: &[String]) -> usize {
    remote
        .iter()
        .rev()
        .zip(local.iter().rev())
        .take_while(|(r, l)| **r == l.as_str())
        .count()
}
