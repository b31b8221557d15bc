//! Release signatures and subtitle release matching.
//!
//! A release signature is the set of scene tags parsed from a file or
//! release name: group, source, resolution and video codec. Matching a
//! subtitle's signature against the media file's decides the match tier.

mod matcher;
mod signature;

pub use matcher::{score, MatchScore, MatchTier};
pub use signature::ReleaseSignature;
