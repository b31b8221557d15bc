use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::language;

/// Errors from the player API.
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

impl PlayerError {
    /// Whether the call may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout)
    }
}

/// A library section and the folders it scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    pub key: String,
    pub title: String,
    /// "movie", "show", "artist", ...
    pub kind: String,
    pub agent: String,
    pub scanner: String,
    pub language: String,
    pub locations: Vec<LibraryLocation>,
}

impl Library {
    /// Only video libraries can carry subtitles.
    pub fn is_video(&self) -> bool {
        matches!(self.kind.as_str(), "movie" | "show")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryLocation {
    pub id: String,
    pub path: String,
}

/// A subtitle stream as the player reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    pub id: String,
    /// ISO 639-2 code as reported (`eng`, `ger`, `nld`).
    pub language_code: Option<String>,
    pub codec: Option<String>,
    /// Sidecar file rather than a stream embedded in the container.
    pub external: bool,
    pub selected: bool,
}

impl SubtitleTrack {
    pub fn is_language(&self, code: &str) -> bool {
        self.language_code
            .as_deref()
            .is_some_and(|c| language::same_language(c, code))
    }
}

/// One playable item as described by the media server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaMetadata {
    pub rating_key: String,
    pub title: String,
    /// "movie" or "episode"
    pub kind: String,
    /// Series title for episodes.
    pub show_title: Option<String>,
    pub year: Option<u32>,
    pub imdb_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// File path as the server sees it.
    pub file_path: Option<String>,
    pub part_id: Option<String>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

/// A live playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSession {
    pub session_id: String,
    /// Item being played.
    pub rating_key: String,
    /// Media part the session streams; track selection applies to it.
    pub part_id: Option<String>,
    pub player: Option<String>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

impl PlaybackSession {
    pub fn selected_track(&self) -> Option<&SubtitleTrack> {
        self.subtitle_tracks.iter().find(|t| t.selected)
    }
}

/// Trait for media server clients.
#[async_trait]
pub trait PlayerClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Metadata for one item, including its file path.
    async fn item_metadata(&self, rating_key: &str) -> Result<MediaMetadata, PlayerError>;

    async fn list_libraries(&self) -> Result<Vec<Library>, PlayerError>;

    /// Up to `limit` file paths from a library, as the server reports them.
    async fn library_file_paths(
        &self,
        library: &Library,
        limit: usize,
    ) -> Result<Vec<String>, PlayerError>;

    async fn list_sessions(&self) -> Result<Vec<PlaybackSession>, PlayerError>;

    /// Makes `track_id` the active subtitle stream of the session.
    async fn select_subtitle_track(
        &self,
        session: &PlaybackSession,
        track_id: &str,
    ) -> Result<(), PlayerError>;

    /// Asks the server to rescan an item so new sidecar files show up.
    async fn refresh_item(&self, rating_key: &str) -> Result<(), PlayerError>;

    /// Sets the default subtitle stream for future plays of an item.
    /// Returns `false` when no stream in that language exists yet.
    async fn set_default_subtitle(
        &self,
        rating_key: &str,
        language: &str,
    ) -> Result<bool, PlayerError>;
}
