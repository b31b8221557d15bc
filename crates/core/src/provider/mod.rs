//! Subtitle provider abstraction.
//!
//! A provider answers two questions: which subtitles exist for an item in a
//! language, and what are the bytes of one of them. `OpenSubtitlesClient`
//! is the only implementation; others would implement the same trait.

mod opensubtitles;
mod types;

pub use opensubtitles::OpenSubtitlesClient;
pub use types::*;
