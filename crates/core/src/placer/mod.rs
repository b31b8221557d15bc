//! Placer module for writing subtitle files next to their media.
//!
//! Placement is two-phase: content is staged into a hidden temporary file
//! in the target directory, then either committed with a rename (atomic on
//! the same filesystem, so the player never reads a partial file) or
//! discarded.
//!
//! Subtitles follow the `{media stem}.{language}.{ext}` naming the player
//! picks up. A hidden `.{subtitle file}.perfect` marker beside a subtitle
//! records that it came from a perfect release match.

mod error;
mod fs_placer;
mod traits;
mod types;

pub use error::PlacerError;
pub use fs_placer::{marker_path, subtitle_path, FsPlacer, SUBTITLE_EXTENSIONS};
pub use traits::Placer;
pub use types::{ExistingSubtitle, PlacedSubtitle, StagedSubtitle};
