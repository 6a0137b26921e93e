//! Forge library
//!
//! Queue state for a batch media converter: the queued files, their
//! conversion lifecycle and change notification for the panels that display
//! them.

pub mod app;
pub mod backend;
pub mod queue;
pub mod utils;

// Re-export main types for easier use
pub use backend::{BackendActor, BackendCommand, BackendHandle, EngineUpdate};
pub use queue::{
    FileStatus, MediaInfo, QueueEntry, QueueManager, QueueSnapshot, QueueSummary, Subscription,
};
pub use utils::{AppSettings, ForgeError};
