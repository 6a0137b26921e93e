//! Application wiring: builds the queue, injects listeners and runs the backend

use crate::backend::BackendActor;
use crate::queue::{QueueManager, QueueSnapshot};
use crate::utils::config::AppSettings;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Build the application's queue with its long-lived listeners attached
pub fn build_queue() -> QueueManager {
    let mut queue = QueueManager::new();
    queue
        .add_listener(|q| debug!("Queue changed: {}", q.summary()))
        .detach();
    queue
}

/// Queue `paths` through the backend and return the resulting queue state
pub async fn run(settings: AppSettings, paths: Vec<PathBuf>) -> Result<QueueSnapshot> {
    let (backend, join) = BackendActor::spawn(build_queue(), settings);

    backend
        .add_paths(paths)
        .await
        .context("Failed to queue input paths")?;
    let snapshot = backend
        .snapshot()
        .await
        .context("Failed to read queue state")?;

    backend.shutdown().await.context("Failed to stop backend")?;
    let queue = join.await.context("Backend task panicked")?;
    info!("Backend stopped with {} queued file(s)", queue.len());

    Ok(snapshot)
}
