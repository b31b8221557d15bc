//! Mock media player for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::language;
use crate::player::{Library, MediaMetadata, PlaybackSession, PlayerClient, PlayerError};

/// Mock implementation of the PlayerClient trait.
///
/// Sessions are served from a sequence: each `list_sessions` call returns
/// the next entry and the last entry repeats, which simulates the player
/// picking up a new subtitle after a few polls. With `set_apply_selection`
/// a select command marks the track selected in later listings.
#[derive(Debug)]
pub struct MockPlayer {
    metadata: Arc<RwLock<HashMap<String, MediaMetadata>>>,
    libraries: Arc<RwLock<Vec<Library>>>,
    library_paths: Arc<RwLock<HashMap<String, Vec<String>>>>,
    session_sequence: Arc<RwLock<Vec<Vec<PlaybackSession>>>>,
    session_listings: Arc<RwLock<usize>>,
    library_listings: Arc<RwLock<usize>>,
    apply_selection: Arc<RwLock<bool>>,
    /// Selected track per session, applied to later listings.
    applied: Arc<RwLock<HashMap<String, String>>>,
    selections: Arc<RwLock<Vec<(String, String)>>>,
    refreshes: Arc<RwLock<Vec<String>>>,
    defaults: Arc<RwLock<Vec<(String, String)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<PlayerError>>>,
}

impl Default for MockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlayer {
    pub fn new() -> Self {
        Self {
            metadata: Arc::new(RwLock::new(HashMap::new())),
            libraries: Arc::new(RwLock::new(Vec::new())),
            library_paths: Arc::new(RwLock::new(HashMap::new())),
            session_sequence: Arc::new(RwLock::new(Vec::new())),
            session_listings: Arc::new(RwLock::new(0)),
            library_listings: Arc::new(RwLock::new(0)),
            apply_selection: Arc::new(RwLock::new(true)),
            applied: Arc::new(RwLock::new(HashMap::new())),
            selections: Arc::new(RwLock::new(Vec::new())),
            refreshes: Arc::new(RwLock::new(Vec::new())),
            defaults: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_metadata(&self, metadata: MediaMetadata) {
        self.metadata
            .write()
            .await
            .insert(metadata.rating_key.clone(), metadata);
    }

    pub async fn set_libraries(&self, libraries: Vec<Library>) {
        *self.libraries.write().await = libraries;
    }

    pub async fn set_library_paths(&self, library_key: &str, paths: Vec<String>) {
        self.library_paths
            .write()
            .await
            .insert(library_key.to_string(), paths);
    }

    /// Sessions returned by successive `list_sessions` calls.
    pub async fn set_session_sequence(&self, sequence: Vec<Vec<PlaybackSession>>) {
        *self.session_sequence.write().await = sequence;
    }

    /// Whether select commands take effect (default: true).
    pub async fn set_apply_selection(&self, apply: bool) {
        *self.apply_selection.write().await = apply;
    }

    pub async fn set_next_error(&self, error: PlayerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Recorded `(session_id, track_id)` select commands.
    pub async fn selections(&self) -> Vec<(String, String)> {
        self.selections.read().await.clone()
    }

    pub async fn refreshes(&self) -> Vec<String> {
        self.refreshes.read().await.clone()
    }

    /// Recorded `(rating_key, language)` default-subtitle calls.
    pub async fn defaults(&self) -> Vec<(String, String)> {
        self.defaults.read().await.clone()
    }

    pub async fn session_listings(&self) -> usize {
        *self.session_listings.read().await
    }

    pub async fn library_listings(&self) -> usize {
        *self.library_listings.read().await
    }

    async fn check_error(&self) -> Result<(), PlayerError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl PlayerClient for MockPlayer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn item_metadata(&self, rating_key: &str) -> Result<MediaMetadata, PlayerError> {
        self.check_error().await?;
        self.metadata
            .read()
            .await
            .get(rating_key)
            .cloned()
            .ok_or_else(|| PlayerError::NotFound(rating_key.to_string()))
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, PlayerError> {
        self.check_error().await?;
        *self.library_listings.write().await += 1;
        Ok(self.libraries.read().await.clone())
    }

    async fn library_file_paths(
        &self,
        library: &Library,
        limit: usize,
    ) -> Result<Vec<String>, PlayerError> {
        self.check_error().await?;
        Ok(self
            .library_paths
            .read()
            .await
            .get(&library.key)
            .map(|paths| paths.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_sessions(&self) -> Result<Vec<PlaybackSession>, PlayerError> {
        self.check_error().await?;
        let index = {
            let mut count = self.session_listings.write().await;
            *count += 1;
            *count - 1
        };

        let sequence = self.session_sequence.read().await;
        let Some(last) = sequence.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        let mut sessions = sequence[index.min(last)].clone();

        let applied = self.applied.read().await;
        for session in &mut sessions {
            if let Some(track_id) = applied.get(&session.session_id) {
                if session.subtitle_tracks.iter().any(|t| &t.id == track_id) {
                    for track in &mut session.subtitle_tracks {
                        track.selected = &track.id == track_id;
                    }
                }
            }
        }
        Ok(sessions)
    }

    async fn select_subtitle_track(
        &self,
        session: &PlaybackSession,
        track_id: &str,
    ) -> Result<(), PlayerError> {
        self.check_error().await?;
        self.selections
            .write()
            .await
            .push((session.session_id.clone(), track_id.to_string()));
        if *self.apply_selection.read().await {
            self.applied
                .write()
                .await
                .insert(session.session_id.clone(), track_id.to_string());
        }
        Ok(())
    }

    async fn refresh_item(&self, rating_key: &str) -> Result<(), PlayerError> {
        self.check_error().await?;
        self.refreshes.write().await.push(rating_key.to_string());
        Ok(())
    }

    async fn set_default_subtitle(
        &self,
        rating_key: &str,
        language: &str,
    ) -> Result<bool, PlayerError> {
        self.check_error().await?;
        self.defaults
            .write()
            .await
            .push((rating_key.to_string(), language.to_string()));

        // Known once a session has listed a stream in that language.
        let sequence = self.session_sequence.read().await;
        Ok(sequence.iter().flatten().any(|s| {
            s.rating_key == rating_key
                && s.subtitle_tracks.iter().any(|t| {
                    t.language_code
                        .as_deref()
                        .is_some_and(|c| language::same_language(c, language))
                })
        }))
    }
}
