pub mod entry;
pub mod listeners;
pub mod manager;
pub mod status;
pub mod summary;

pub use entry::{ContainerInfo, MediaInfo, QueueEntry, ScanType, VideoStreamInfo};
pub use listeners::{ListenerId, Subscription};
pub use manager::{QueueManager, QueueSnapshot};
pub use status::FileStatus;
pub use summary::QueueSummary;
