//! Mock subtitle provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::language;
use crate::provider::{ProviderError, ProviderQuery, ProviderResult, SubtitleProvider};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: ProviderQuery,
    pub language: String,
}

/// Mock implementation of the SubtitleProvider trait.
///
/// Provides controllable behavior for testing:
/// - Canned results and file content per result id
/// - Queued download failures (transient or permanent)
/// - Recorded searches and downloads for assertions
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockProvider::new();
/// provider.add_result(fixtures::provider_result("1", "en", "Heat.1995.x264-AMIABLE"), fixtures::ENGLISH_SRT).await;
/// provider.push_download_error(ProviderError::Timeout).await;
///
/// // First download times out, the retry returns the content.
/// ```
#[derive(Debug, Default)]
pub struct MockProvider {
    results: Arc<RwLock<Vec<ProviderResult>>>,
    content: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    downloads: Arc<RwLock<Vec<String>>>,
    download_errors: Arc<RwLock<VecDeque<ProviderError>>>,
    next_search_error: Arc<RwLock<Option<ProviderError>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a search result and the content its download returns.
    pub async fn add_result(&self, result: ProviderResult, content: impl AsRef<[u8]>) {
        self.add_content(&result.id, content.as_ref().to_vec()).await;
        self.results.write().await.push(result);
    }

    /// Sets downloadable content without a matching search result.
    pub async fn add_content(&self, id: &str, content: Vec<u8>) {
        self.content.write().await.insert(id.to_string(), content);
    }

    /// Queues an error for the next download call; errors are used in order.
    pub async fn push_download_error(&self, error: ProviderError) {
        self.download_errors.write().await.push_back(error);
    }

    /// Makes the next search fail.
    pub async fn set_next_search_error(&self, error: ProviderError) {
        *self.next_search_error.write().await = Some(error);
    }

    pub async fn search_calls(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Languages searched, in order.
    pub async fn searched_languages(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|s| s.language.clone())
            .collect()
    }

    /// Result ids passed to `download`, one entry per attempt.
    pub async fn download_calls(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl SubtitleProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &ProviderQuery,
        language: &str,
    ) -> Result<Vec<ProviderResult>, ProviderError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.clone(),
            language: language.to_string(),
        });

        if let Some(error) = self.next_search_error.write().await.take() {
            return Err(error);
        }

        Ok(self
            .results
            .read()
            .await
            .iter()
            .filter(|r| language::same_language(&r.language, language))
            .cloned()
            .collect())
    }

    async fn download(&self, result_id: &str) -> Result<Vec<u8>, ProviderError> {
        self.downloads.write().await.push(result_id.to_string());

        if let Some(error) = self.download_errors.write().await.pop_front() {
            return Err(error);
        }

        self.content
            .read()
            .await
            .get(result_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(result_id.to_string()))
    }
}
