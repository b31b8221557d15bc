//! Remote-to-local path translation.
//!
//! Plex reports file paths as its own filesystem sees them. This module maps
//! them to paths the service can open, checks mappings against real files,
//! and proposes mappings from observed library paths.

mod discovery;
mod mapper;
mod suggest;
mod validate;

pub use discovery::{DiscoveryError, DiscoveryStatus, PathDiscovery};
pub use mapper::{PathMapper, PathMapping, PathMappingError};
pub use suggest::{suggest, suggest_mappings, Confidence, LocalIndex, MappingSuggestion};
pub use validate::{validate_paths, PathCheck, ValidationReport, ValidationSummary};
