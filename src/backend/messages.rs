use crate::queue::{MediaInfo, QueueEntry, QueueSnapshot};
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Commands sent to the backend that owns the queue
#[derive(Debug)]
pub enum BackendCommand {
    // Intake
    AddPaths(Vec<PathBuf>),
    AddEntry(QueueEntry),

    // Queue editing
    Remove(usize),
    Clear,
    ClearCompleted,
    Select(usize),
    Cancel(PathBuf),
    Retry(PathBuf),

    /// Report from an encode worker
    Engine(EngineUpdate),

    /// Reply with a copy of the current queue
    Snapshot(oneshot::Sender<QueueSnapshot>),

    // System
    Shutdown,
}

/// Progress and outcome reports from an encode worker, keyed by entry path
#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    Started { path: PathBuf },
    Progress { path: PathBuf, progress: f64 },
    Finished { path: PathBuf },
    Failed { path: PathBuf, error: String },
    Skipped { path: PathBuf },
    Probed { path: PathBuf, info: MediaInfo },
}

impl EngineUpdate {
    pub fn path(&self) -> &PathBuf {
        match self {
            EngineUpdate::Started { path }
            | EngineUpdate::Progress { path, .. }
            | EngineUpdate::Finished { path }
            | EngineUpdate::Failed { path, .. }
            | EngineUpdate::Skipped { path }
            | EngineUpdate::Probed { path, .. } => path,
        }
    }
}
