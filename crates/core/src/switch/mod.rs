//! Live subtitle switching.
//!
//! After a subtitle lands on disk the player needs a while to rescan before
//! the new stream shows up in the session. The coordinator polls the session
//! on a fixed interval, selects the stream once it appears and confirms the
//! selection, all within a bounded time.

mod config;
mod coordinator;

pub use config::SwitchConfig;
pub use coordinator::{GiveUpReason, PlaybackSwitchCoordinator, SwitchOutcome, SwitchTarget};
