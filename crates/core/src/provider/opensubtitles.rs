//! OpenSubtitles.com REST API (v1) client.
//!
//! Logs in with username and password to obtain a JWT, which is cached and
//! renewed when it expires or the API answers 401.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::OpenSubtitlesConfig;
use crate::language;

use super::{ProviderError, ProviderQuery, ProviderResult, SubtitleProvider};

/// Tokens are valid for 24 hours, renew a little early.
const TOKEN_LIFETIME: Duration = Duration::from_secs(23 * 60 * 60);

struct Session {
    token: String,
    expires_at: Instant,
}

/// OpenSubtitles client implementation.
pub struct OpenSubtitlesClient {
    client: Client,
    config: OpenSubtitlesConfig,
    session: Arc<RwLock<Option<Session>>>,
}

impl OpenSubtitlesClient {
    pub fn new(config: OpenSubtitlesConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::ConnectionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.config.api_key)
            .header("Accept", "application/json")
    }

    async fn login(&self) -> Result<String, ProviderError> {
        let url = format!("{}/login", self.base_url());
        info!("Authenticating with OpenSubtitles");

        let response = self
            .with_api_key(self.client.post(&url))
            .json(&LoginRequest {
                username: &self.config.username,
                password: &self.config.password,
            })
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthenticationFailed(format!(
                "login rejected (HTTP {})",
                status.as_u16()
            )));
        }
        let login: LoginResponse = parse_response(response, "/login").await?;

        let mut session = self.session.write().await;
        *session = Some(Session {
            token: login.token.clone(),
            expires_at: Instant::now() + TOKEN_LIFETIME,
        });
        debug!("OpenSubtitles login successful");
        Ok(login.token)
    }

    async fn token(&self) -> Result<String, ProviderError> {
        {
            let session = self.session.read().await;
            if let Some(s) = session.as_ref().filter(|s| s.expires_at > Instant::now()) {
                return Ok(s.token.clone());
            }
        }
        self.login().await
    }

    async fn clear_token(&self) {
        let mut session = self.session.write().await;
        *session = None;
    }

    /// Authenticated JSON request; logs in again once on 401.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url(), path);

        for attempt in 0..2 {
            let token = self.token().await?;
            let mut request = self
                .with_api_key(self.client.request(method.clone(), &url))
                .bearer_auth(&token)
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(map_send_error)?;
            if response.status() == StatusCode::UNAUTHORIZED && attempt == 0 {
                warn!("OpenSubtitles token rejected, logging in again");
                self.clear_token().await;
                continue;
            }
            return parse_response(response, path).await;
        }

        Err(ProviderError::AuthenticationFailed(
            "token rejected after re-login".to_string(),
        ))
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::ConnectionFailed(e.to_string())
    } else {
        ProviderError::ApiError {
            status: 0,
            message: e.to_string(),
        }
    }
}

fn classify_status(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationFailed(message),
        404 => ProviderError::NotFound(message),
        429 => ProviderError::RateLimited,
        s if s >= 500 => ProviderError::ServerError(s),
        s => ProviderError::ApiError { status: s, message },
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, format!("{}: {}", path, body)));
    }
    let bytes = response.bytes().await.map_err(map_send_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", path, e)))
}

/// The API wants the numeric part of an IMDB id without leading zeros.
fn imdb_number(imdb_id: &str) -> Option<String> {
    let digits = imdb_id.trim().trim_start_matches("tt").trim_start_matches('0');
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then(|| digits.to_string())
}

fn search_params(query: &ProviderQuery, language: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![("languages", language.to_string())];

    match query.imdb_id.as_deref().and_then(imdb_number) {
        Some(imdb) => params.push(("imdb_id", imdb)),
        None => {
            params.push(("query", query.title.clone()));
            if let Some(year) = query.year {
                params.push(("year", year.to_string()));
            }
        }
    }
    if let Some(season) = query.season {
        params.push(("season_number", season.to_string()));
    }
    if let Some(episode) = query.episode {
        params.push(("episode_number", episode.to_string()));
    }
    params
}

/// Turns raw search entries into results in `language`, dropping entries
/// without files or in another language.
fn into_results(entries: Vec<SearchEntry>, language: &str) -> Vec<ProviderResult> {
    entries
        .into_iter()
        .filter(|e| language::same_language(&e.attributes.language, language))
        .filter_map(|e| {
            let attrs = e.attributes;
            let file = attrs.files.into_iter().next()?;
            Some(ProviderResult {
                id: file.file_id.to_string(),
                language: language.to_string(),
                release: attrs.release.unwrap_or_default(),
                file_name: file.file_name.unwrap_or_default(),
                download_count: attrs.download_count,
            })
        })
        .collect()
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesClient {
    fn name(&self) -> &str {
        "opensubtitles"
    }

    async fn search(
        &self,
        query: &ProviderQuery,
        language: &str,
    ) -> Result<Vec<ProviderResult>, ProviderError> {
        let params = search_params(query, language);
        debug!(title = %query.title, language = %language, "Searching OpenSubtitles");

        let response: SearchResponse = self
            .request(Method::GET, "/subtitles", &params, None)
            .await?;
        let total = response.data.len();
        let results = into_results(response.data, language);
        info!(
            language = %language,
            returned = total,
            usable = results.len(),
            "OpenSubtitles search finished"
        );
        Ok(results)
    }

    async fn download(&self, result_id: &str) -> Result<Vec<u8>, ProviderError> {
        let file_id: u64 = result_id.parse().map_err(|_| {
            ProviderError::InvalidResponse(format!("file id '{}' is not numeric", result_id))
        })?;
        let body = serde_json::json!({ "file_id": file_id });
        let link: DownloadResponse = self
            .request(Method::POST, "/download", &[], Some(&body))
            .await?;
        debug!(file_id, remaining = ?link.remaining, "Download link obtained");

        let response = self
            .client
            .get(&link.link)
            .timeout(Duration::from_secs(self.config.download_timeout_secs as u64))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, format!("download link for {}", file_id)));
        }
        let bytes = response.bytes().await.map_err(map_send_error)?;
        Ok(bytes.to_vec())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    attributes: SearchAttributes,
}

#[derive(Deserialize)]
struct SearchAttributes {
    language: String,
    release: Option<String>,
    download_count: Option<u64>,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Deserialize)]
struct SearchFile {
    file_id: u64,
    file_name: Option<String>,
}

#[derive(Deserialize)]
struct DownloadResponse {
    link: String,
    remaining: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "total_count": 3,
        "data": [
            {"id": "1", "type": "subtitle", "attributes": {
                "language": "en", "download_count": 5120,
                "release": "Breaking.Bad.S01E01.720p.BluRay.x264-DEMAND",
                "files": [{"file_id": 1001, "file_name": "Breaking.Bad.S01E01.srt"}]}},
            {"id": "2", "type": "subtitle", "attributes": {
                "language": "pt-BR", "release": null,
                "files": [{"file_id": 1002}]}},
            {"id": "3", "type": "subtitle", "attributes": {
                "language": "en", "release": "no files", "files": []}}
        ]
    }"#;

    #[test]
    fn test_into_results_filters_language_and_missing_files() {
        let response: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let results = into_results(response.data, "en");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "1001");
        assert_eq!(results[0].download_count, Some(5120));
        assert!(results[0].release.ends_with("-DEMAND"));
    }

    #[test]
    fn test_region_variant_counts_as_language() {
        let response: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let results = into_results(response.data, "pt");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].release, "");
        assert_eq!(results[0].download_count, None);
    }

    #[test]
    fn test_malformed_shape_is_rejected() {
        // `data` entries without attributes are a shape error, not an empty result.
        let bad = r#"{"data": [{"id": "1"}]}"#;
        assert!(serde_json::from_str::<SearchResponse>(bad).is_err());
        let bad_id = r#"{"data": [{"attributes": {"language": "en", "files": [{"file_id": "x"}]}}]}"#;
        assert!(serde_json::from_str::<SearchResponse>(bad_id).is_err());
    }

    #[test]
    fn test_search_params_prefers_imdb() {
        let query = ProviderQuery {
            title: "Breaking Bad".to_string(),
            year: Some(2008),
            imdb_id: Some("tt0959621".to_string()),
            season: Some(1),
            episode: Some(2),
            file_name: None,
        };
        let params = search_params(&query, "nl");
        assert!(params.contains(&("languages", "nl".to_string())));
        assert!(params.contains(&("imdb_id", "959621".to_string())));
        assert!(params.contains(&("season_number", "1".to_string())));
        assert!(params.contains(&("episode_number", "2".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "query"));
    }

    #[test]
    fn test_search_params_title_fallback() {
        let query = ProviderQuery {
            title: "Arrival".to_string(),
            year: Some(2016),
            ..Default::default()
        };
        let params = search_params(&query, "en");
        assert!(params.contains(&("query", "Arrival".to_string())));
        assert!(params.contains(&("year", "2016".to_string())));
    }

    #[test]
    fn test_imdb_number() {
        assert_eq!(imdb_number("tt0959621").as_deref(), Some("959621"));
        assert_eq!(imdb_number("1234").as_deref(), Some("1234"));
        assert_eq!(imdb_number("tt"), None);
        assert_eq!(imdb_number("abc"), None);
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new()),
            ProviderError::ServerError(502)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_ACCEPTABLE, String::new()),
            ProviderError::ApiError { status: 406, .. }
        ));
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_retryable());
        assert!(!classify_status(StatusCode::BAD_REQUEST, String::new()).is_retryable());
    }
}
