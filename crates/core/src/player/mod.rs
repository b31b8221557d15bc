//! Media player abstraction.
//!
//! This module provides a `PlayerClient` trait for the media server the
//! service reacts to: library listing, live sessions and subtitle stream
//! selection. `PlexClient` is the Plex Media Server implementation.

mod plex;
mod types;

pub use plex::PlexClient;
pub use types::*;
