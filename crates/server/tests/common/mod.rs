//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling E2E testing of the webhook
//! and discovery API without a Plex server or OpenSubtitles account.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use plexsubs_core::{
    load_config_from_str,
    paths::PathMapping,
    switch::SwitchConfig,
    testing::{MockPlayer, MockProvider},
    Config, FsPlacer,
};
use plexsubs_server::state::AppState;

/// Re-export fixtures for test convenience
pub use plexsubs_core::testing::fixtures;

/// Media file every fixture library contains.
pub const MEDIA_FILE: &str = "Heat.1995.1080p.BluRay.x264-AMIABLE.mkv";
/// Release name matching `MEDIA_FILE` perfectly.
pub const PERFECT_RELEASE: &str = "Heat.1995.1080p.BluRay.x264-AMIABLE";

const BASE_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 9000

[plex]
token = "abcdefghijklmnop"

[opensubtitles]
api_key = "key"
username = "user"
password = "pass"

[subtitles]
languages = ["en"]
retry_delay_secs = 0
"#;

/// In-process server over `MockPlayer` and `MockProvider`.
///
/// Subtitles are placed for real into a temporary library that the
/// player sees as `/media`. Item `1001` is `MEDIA_FILE`.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock player - configure metadata, libraries and sessions
    pub player: Arc<MockPlayer>,
    /// Mock provider - configure search results and downloads
    pub provider: Arc<MockProvider>,
    /// Directory holding `MEDIA_FILE`
    pub media_dir: PathBuf,
    /// Temporary library root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test fixture, letting the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let library = temp_dir.path().join("library");
        let media_dir = library.join("movies/Heat (1995)");
        std::fs::create_dir_all(&media_dir).expect("Failed to create media dir");
        std::fs::write(media_dir.join(MEDIA_FILE), b"movie").expect("Failed to write media");

        let mut config = load_config_from_str(BASE_CONFIG).expect("Invalid base config");
        config.path_mappings = vec![PathMapping::new(
            "/media",
            library.display().to_string(),
        )];
        config.switch = SwitchConfig {
            timeout_secs: 1,
            poll_interval_ms: 20,
            set_default_on_give_up: true,
        };
        config.discovery.local_roots = vec![temp_dir.path().to_path_buf()];
        adjust(&mut config);

        // Create mocks
        let player = Arc::new(MockPlayer::new());
        let provider = Arc::new(MockProvider::new());
        player
            .set_metadata(fixtures::metadata(
                "1001",
                &format!("/media/movies/Heat (1995)/{}", MEDIA_FILE),
            ))
            .await;

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&player) as Arc<dyn plexsubs_core::PlayerClient>,
            Arc::clone(&provider) as Arc<dyn plexsubs_core::SubtitleProvider>,
            Arc::new(FsPlacer::new()),
            CancellationToken::new(),
        ));

        let router = plexsubs_server::api::create_router(state);

        Self {
            router,
            player,
            provider,
            media_dir,
            temp_dir,
        }
    }

    /// Path a subtitle in `code` gets placed at.
    pub fn subtitle_path(&self, code: &str) -> PathBuf {
        self.media_dir.join(format!("{}.{}.srt", PERFECT_RELEASE, code))
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send("GET", path, None, Body::empty()).await
    }

    /// POST a JSON body, the way hand-written webhook senders do.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &body.to_string()).await
    }

    /// POST a raw body labelled as JSON, for malformed payloads.
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.send("POST", path, Some("application/json"), Body::from(body.to_string()))
            .await
    }

    /// POST the way Plex does: multipart with a `payload` field.
    pub async fn post_multipart(&self, path: &str, payload: Value) -> TestResponse {
        const BOUNDARY: &str = "plexsubs-test-boundary";
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"payload\"\r\n\r\n{payload}\r\n--{BOUNDARY}--\r\n"
        );
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        self.send("POST", path, Some(&content_type), Body::from(body))
            .await
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
