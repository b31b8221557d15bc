//! Fixed-delay download retries.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::metrics;
use crate::provider::{ProviderError, SubtitleProvider};

use super::config::AcquisitionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl From<&AcquisitionConfig> for RetryPolicy {
    fn from(config: &AcquisitionConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

/// State of one candidate's download.
#[derive(Debug, Clone, Default)]
pub struct DownloadAttempt {
    pub attempts: u32,
    pub next_delay: Option<Duration>,
    pub last_error: Option<ProviderError>,
}

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// Retries used up, or a permanent error.
    Failed(DownloadAttempt),
    Cancelled,
}

/// Downloads `result_id`, retrying transient errors with a fixed delay.
/// Permanent errors end the attempt immediately.
pub async fn download_with_retry(
    provider: &dyn SubtitleProvider,
    result_id: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, DownloadError> {
    let mut state = DownloadAttempt::default();

    loop {
        state.attempts += 1;
        match provider.download(result_id).await {
            Ok(bytes) => {
                metrics::DOWNLOAD_ATTEMPTS_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                debug!(result_id = %result_id, attempts = state.attempts, "Download succeeded");
                return Ok(bytes);
            }
            Err(e) => {
                let retryable = e.is_retryable() && state.attempts < policy.max_attempts();
                metrics::DOWNLOAD_ATTEMPTS_TOTAL
                    .with_label_values(&[if e.is_retryable() { "transient" } else { "permanent" }])
                    .inc();
                warn!(
                    result_id = %result_id,
                    attempt = state.attempts,
                    max_attempts = policy.max_attempts(),
                    error = %e,
                    retrying = retryable,
                    "Download failed"
                );
                state.last_error = Some(e);
                if !retryable {
                    state.next_delay = None;
                    return Err(DownloadError::Failed(state));
                }
                state.next_delay = Some(policy.delay);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}
