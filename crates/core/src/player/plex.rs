//! Plex Media Server client.
//!
//! Talks to the server's JSON API (`Accept: application/json`) with the
//! `X-Plex-Token` header. Only the handful of endpoints the service needs
//! are modelled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::config::PlexConfig;

use super::{
    Library, LibraryLocation, MediaMetadata, PlaybackSession, PlayerClient, PlayerError,
    SubtitleTrack,
};

/// Plex stream type for subtitles.
const SUBTITLE_STREAM: u32 = 3;

/// Plex metadata type for episodes, used to list files of show libraries.
const EPISODE_TYPE: &str = "4";

/// Plex API client.
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(config: &PlexConfig) -> Result<Self, PlayerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PlayerError::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, PlayerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = %path, "Plex request");

        let response = self
            .client
            .request(method, &url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                PlayerError::AuthenticationFailed(format!("HTTP {} from {}", status, path)),
            ),
            StatusCode::NOT_FOUND => Err(PlayerError::NotFound(path.to_string())),
            s if !s.is_success() => Err(PlayerError::ApiError(format!("HTTP {} from {}", s, path))),
            _ => Ok(response),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlayerError> {
        let response = self.send(Method::GET, path, query).await?;
        response
            .json()
            .await
            .map_err(|e| PlayerError::InvalidResponse(format!("{}: {}", path, e)))
    }

    async fn put(&self, path: &str, query: &[(&str, &str)]) -> Result<(), PlayerError> {
        self.send(Method::PUT, path, query).await.map(|_| ())
    }

    async fn select_part_stream(&self, part_id: &str, stream_id: &str) -> Result<(), PlayerError> {
        self.put(
            &format!("/library/parts/{}", part_id),
            &[("subtitleStreamID", stream_id), ("allParts", "1")],
        )
        .await
    }
}

fn map_send_error(e: reqwest::Error) -> PlayerError {
    if e.is_timeout() {
        PlayerError::Timeout
    } else if e.is_connect() {
        PlayerError::ConnectionFailed(e.to_string())
    } else {
        PlayerError::ApiError(e.to_string())
    }
}

#[async_trait]
impl PlayerClient for PlexClient {
    fn name(&self) -> &str {
        "plex"
    }

    async fn item_metadata(&self, rating_key: &str) -> Result<MediaMetadata, PlayerError> {
        let path = format!("/library/metadata/{}", rating_key);
        let envelope: Envelope = self.get_json(&path, &[]).await?;
        envelope
            .media_container
            .metadata
            .into_iter()
            .next()
            .map(PlexMetadata::into_media_metadata)
            .ok_or_else(|| PlayerError::NotFound(rating_key.to_string()))
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, PlayerError> {
        let envelope: Envelope = self.get_json("/library/sections", &[]).await?;
        Ok(envelope
            .media_container
            .directory
            .into_iter()
            .map(PlexDirectory::into_library)
            .collect())
    }

    async fn library_file_paths(
        &self,
        library: &Library,
        limit: usize,
    ) -> Result<Vec<String>, PlayerError> {
        let path = format!("/library/sections/{}/all", library.key);
        let size = limit.to_string();
        let mut query = vec![
            ("X-Plex-Container-Start", "0"),
            ("X-Plex-Container-Size", size.as_str()),
        ];
        if library.kind == "show" {
            query.push(("type", EPISODE_TYPE));
        }

        let envelope: Envelope = self.get_json(&path, &query).await?;
        Ok(envelope
            .media_container
            .metadata
            .iter()
            .filter_map(PlexMetadata::first_file)
            .take(limit)
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<PlaybackSession>, PlayerError> {
        let envelope: Envelope = self.get_json("/status/sessions", &[]).await?;
        Ok(envelope
            .media_container
            .metadata
            .into_iter()
            .filter_map(PlexMetadata::into_session)
            .collect())
    }

    async fn select_subtitle_track(
        &self,
        session: &PlaybackSession,
        track_id: &str,
    ) -> Result<(), PlayerError> {
        let part_id = session.part_id.as_deref().ok_or_else(|| {
            PlayerError::InvalidResponse(format!(
                "session {} has no media part",
                session.session_id
            ))
        })?;
        debug!(session = %session.session_id, part = %part_id, track = %track_id, "Selecting subtitle stream");
        self.select_part_stream(part_id, track_id).await
    }

    async fn refresh_item(&self, rating_key: &str) -> Result<(), PlayerError> {
        self.put(&format!("/library/metadata/{}/refresh", rating_key), &[])
            .await
    }

    async fn set_default_subtitle(
        &self,
        rating_key: &str,
        language: &str,
    ) -> Result<bool, PlayerError> {
        let metadata = self.item_metadata(rating_key).await?;
        let Some(part_id) = metadata.part_id.as_deref() else {
            warn!(rating_key = %rating_key, "Item has no media part, cannot set default subtitle");
            return Ok(false);
        };

        // External sidecars first, they are what this service places.
        let track = metadata
            .subtitle_tracks
            .iter()
            .filter(|t| t.is_language(language))
            .max_by_key(|t| t.external);

        match track {
            Some(track) => {
                self.select_part_stream(part_id, &track.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// Plex JSON shapes. Numeric ids are sometimes strings, sometimes numbers.

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
    #[serde(rename = "Directory", default)]
    directory: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexDirectory {
    #[serde(deserialize_with = "string_or_number")]
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    agent: String,
    #[serde(default)]
    scanner: String,
    #[serde(default)]
    language: String,
    #[serde(rename = "Location", default)]
    location: Vec<PlexLocation>,
}

#[derive(Debug, Deserialize)]
struct PlexLocation {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexMetadata {
    #[serde(deserialize_with = "string_or_number")]
    rating_key: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    grandparent_title: Option<String>,
    year: Option<u32>,
    parent_index: Option<u32>,
    index: Option<u32>,
    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
    #[serde(rename = "Media", default)]
    media: Vec<PlexMedia>,
    #[serde(rename = "Session")]
    session: Option<PlexSession>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    session_key: Option<String>,
    #[serde(rename = "Player")]
    player: Option<PlexPlayer>,
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlexMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<PlexPart>,
}

#[derive(Debug, Deserialize)]
struct PlexPart {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    file: Option<String>,
    #[serde(rename = "Stream", default)]
    streams: Vec<PlexStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexStream {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    stream_type: u32,
    language_code: Option<String>,
    language_tag: Option<String>,
    codec: Option<String>,
    /// Only sidecar streams carry a key.
    key: Option<String>,
    #[serde(default)]
    selected: bool,
}

#[derive(Debug, Deserialize)]
struct PlexSession {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexPlayer {
    title: Option<String>,
    product: Option<String>,
}

impl PlexDirectory {
    fn into_library(self) -> Library {
        Library {
            key: self.key,
            title: self.title,
            kind: self.kind,
            agent: self.agent,
            scanner: self.scanner,
            language: self.language,
            locations: self
                .location
                .into_iter()
                .map(|l| LibraryLocation {
                    id: l.id,
                    path: l.path,
                })
                .collect(),
        }
    }
}

impl PlexMetadata {
    fn first_part(&self) -> Option<&PlexPart> {
        self.media.iter().flat_map(|m| m.parts.iter()).next()
    }

    fn first_file(&self) -> Option<String> {
        self.media
            .iter()
            .flat_map(|m| m.parts.iter())
            .find_map(|p| p.file.clone())
    }

    fn subtitle_tracks(&self) -> Vec<SubtitleTrack> {
        self.first_part()
            .map(|part| {
                part.streams
                    .iter()
                    .filter(|s| s.stream_type == SUBTITLE_STREAM)
                    .map(PlexStream::to_track)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn imdb_id(&self) -> Option<String> {
        self.guids
            .iter()
            .find_map(|g| g.id.strip_prefix("imdb://"))
            .map(String::from)
    }

    fn into_media_metadata(self) -> MediaMetadata {
        let is_episode = self.kind == "episode";
        MediaMetadata {
            imdb_id: self.imdb_id(),
            file_path: self.first_file(),
            part_id: self.first_part().map(|p| p.id.clone()),
            subtitle_tracks: self.subtitle_tracks(),
            show_title: if is_episode { self.grandparent_title.clone() } else { None },
            season: if is_episode { self.parent_index } else { None },
            episode: if is_episode { self.index } else { None },
            rating_key: self.rating_key,
            title: self.title,
            kind: self.kind,
            year: self.year,
        }
    }

    fn into_session(self) -> Option<PlaybackSession> {
        let session_id = self
            .session
            .as_ref()
            .map(|s| s.id.clone())
            .or_else(|| self.session_key.clone())?;

        Some(PlaybackSession {
            part_id: self.first_part().map(|p| p.id.clone()),
            subtitle_tracks: self.subtitle_tracks(),
            player: self
                .player
                .as_ref()
                .and_then(|p| p.title.clone().or_else(|| p.product.clone())),
            session_id,
            rating_key: self.rating_key,
        })
    }
}

impl PlexStream {
    fn to_track(&self) -> SubtitleTrack {
        SubtitleTrack {
            id: self.id.clone(),
            language_code: self
                .language_code
                .clone()
                .or_else(|| self.language_tag.clone()),
            codec: self.codec.clone(),
            external: self.key.is_some(),
            selected: self.selected,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_number(deserializer).map(Some)
}
