//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (media player and subtitle provider), allowing end-to-end runs of the
//! acquisition and switching flow without a Plex server or network access.
//! Placement is exercised against the real [`FsPlacer`](crate::placer::FsPlacer)
//! in a temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use plexsubs_core::testing::{fixtures, MockPlayer, MockProvider};
//!
//! let player = MockPlayer::new();
//! let provider = MockProvider::new();
//!
//! // Configure mock responses
//! provider.add_result(fixtures::provider_result("1", "en", "Heat.1995.1080p.BluRay.x264-AMIABLE"), fixtures::ENGLISH_SRT).await;
//! player.set_metadata(fixtures::metadata("1001", "/media/movies/Heat.mkv")).await;
//! ```

mod mock_player;
mod mock_provider;

pub use mock_player::MockPlayer;
pub use mock_provider::{MockProvider, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::acquisition::MediaItem;
    use crate::player::{Library, LibraryLocation, MediaMetadata, PlaybackSession, SubtitleTrack};
    use crate::provider::ProviderResult;

    /// English dialogue that passes language verification.
    pub const ENGLISH_SRT: &str = "1
00:00:01,000 --> 00:00:03,500
<i>I don't know what you are talking about.</i>

2
00:00:04,000 --> 00:00:06,000
We have to go. There is no time for this.

3
00:00:06,500 --> 00:00:09,000
You said that it was safe, and it is not.

4
00:00:09,500 --> 00:00:12,000
Just tell me the truth. Can you do that for me?
";

    /// Dutch dialogue that passes language verification.
    pub const DUTCH_SRT: &str = "1
00:00:01,000 --> 00:00:03,500
Ik weet niet wat je bedoelt.

2
00:00:04,000 --> 00:00:06,000
Het is hier niet veilig voor ons, maar we hebben geen keus.

3
00:00:06,500 --> 00:00:09,000
Waar is de auto? Ik heb hem daar gezien.

4
00:00:09,500 --> 00:00:12,000
Zeg me de waarheid. Kan je dat voor mij doen?
";

    /// Create a library with a single location.
    pub fn library(key: &str, title: &str, kind: &str, path: &str) -> Library {
        Library {
            key: key.to_string(),
            title: title.to_string(),
            kind: kind.to_string(),
            agent: "tv.plex.agents.movie".to_string(),
            scanner: "Plex Movie".to_string(),
            language: "en-US".to_string(),
            locations: vec![LibraryLocation {
                id: key.to_string(),
                path: path.to_string(),
            }],
        }
    }

    /// The movie "Heat (1995)" at the given player path.
    pub fn media_item(remote_path: &str) -> MediaItem {
        MediaItem {
            rating_key: "1001".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            imdb_id: Some("tt0113277".to_string()),
            season: None,
            episode: None,
            remote_path: remote_path.to_string(),
        }
    }

    /// Player metadata for "Heat (1995)" without subtitle streams.
    pub fn metadata(rating_key: &str, file_path: &str) -> MediaMetadata {
        MediaMetadata {
            rating_key: rating_key.to_string(),
            title: "Heat".to_string(),
            kind: "movie".to_string(),
            show_title: None,
            year: Some(1995),
            imdb_id: Some("tt0113277".to_string()),
            season: None,
            episode: None,
            file_path: Some(file_path.to_string()),
            part_id: Some(format!("{}00", rating_key)),
            subtitle_tracks: Vec::new(),
        }
    }

    /// Create a provider result whose file is named after the release.
    pub fn provider_result(id: &str, language: &str, release: &str) -> ProviderResult {
        ProviderResult {
            id: id.to_string(),
            language: language.to_string(),
            release: release.to_string(),
            file_name: format!("{}.srt", release),
            download_count: None,
        }
    }

    pub fn session(session_id: &str, rating_key: &str, tracks: Vec<SubtitleTrack>) -> PlaybackSession {
        PlaybackSession {
            session_id: session_id.to_string(),
            rating_key: rating_key.to_string(),
            part_id: Some(format!("{}00", rating_key)),
            player: Some("Living Room".to_string()),
            subtitle_tracks: tracks,
        }
    }

    pub fn track(id: &str, language_code: &str, external: bool, selected: bool) -> SubtitleTrack {
        SubtitleTrack {
            id: id.to_string(),
            language_code: Some(language_code.to_string()),
            codec: Some("srt".to_string()),
            external,
            selected,
        }
    }
}
