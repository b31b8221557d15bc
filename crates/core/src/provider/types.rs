use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors from a subtitle provider, classified at the client boundary.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Provider server error: HTTP {0}")]
    ServerError(u16),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Response did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },
}

impl ProviderError {
    /// Transient failures worth another attempt. Everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout | Self::RateLimited | Self::ServerError(_)
        )
    }
}

/// What to search for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderQuery {
    pub title: String,
    pub year: Option<u32>,
    /// IMDB id (`tt0959621`); preferred over title search when present.
    pub imdb_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Media file name without directory.
    pub file_name: Option<String>,
}

/// One search result, validated by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResult {
    /// Identifier passed back to `download`.
    pub id: String,
    /// ISO 639-1 code of the claimed language.
    pub language: String,
    /// Release name the uploader attached, may be empty.
    pub release: String,
    pub file_name: String,
    /// Popularity signal, when the provider reports one.
    pub download_count: Option<u64>,
}

/// Trait for subtitle providers.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Provider name for logging and metrics.
    fn name(&self) -> &str;

    /// Searches subtitles for `query` in `language` (ISO 639-1).
    async fn search(
        &self,
        query: &ProviderQuery,
        language: &str,
    ) -> Result<Vec<ProviderResult>, ProviderError>;

    /// Fetches the subtitle file content for a search result id.
    async fn download(&self, result_id: &str) -> Result<Vec<u8>, ProviderError>;
}
