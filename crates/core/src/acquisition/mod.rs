//! Subtitle acquisition for one media item.
//!
//! `AcquisitionOrchestrator::run` resolves the item's local path, walks the
//! configured languages in priority order, ranks provider candidates by
//! release match, verifies downloaded text against the claimed language and
//! places the winner atomically.

mod config;
mod orchestrator;
mod retry;
mod types;

pub use config::AcquisitionConfig;
pub use orchestrator::AcquisitionOrchestrator;
pub use retry::{download_with_retry, DownloadAttempt, DownloadError, RetryPolicy};
pub use types::*;
