use super::messages::{BackendCommand, EngineUpdate};
use crate::queue::{FileStatus, QueueEntry, QueueManager, QueueSnapshot};
use crate::utils::config::AppSettings;
use crate::utils::error::{ForgeError, Result};
use crate::utils::files::{entry_from_path, scan_folder};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sole owner of the `QueueManager`.
///
/// UI code and encode workers never touch the queue directly; they send
/// `BackendCommand`s through a `BackendHandle`. The actor applies one command
/// at a time, including listener dispatch, so every update-then-notify step is
/// atomic with respect to every other mutation.
pub struct BackendActor {
    receiver: mpsc::Receiver<BackendCommand>,
    queue: QueueManager,
    settings: AppSettings,
}

/// Cloneable sender side of the backend
#[derive(Debug, Clone)]
pub struct BackendHandle {
    sender: mpsc::Sender<BackendCommand>,
}

impl BackendActor {
    pub fn new(
        queue: QueueManager,
        settings: AppSettings,
        receiver: mpsc::Receiver<BackendCommand>,
    ) -> Self {
        Self {
            receiver,
            queue,
            settings,
        }
    }

    /// Start the actor on the current Tokio runtime.
    ///
    /// The join handle yields the queue back once the actor shuts down.
    pub fn spawn(
        queue: QueueManager,
        settings: AppSettings,
    ) -> (BackendHandle, JoinHandle<QueueManager>) {
        let (sender, receiver) = mpsc::channel(settings.command_buffer.max(1));
        let actor = Self::new(queue, settings, receiver);
        let join = tokio::spawn(actor.run());
        (BackendHandle { sender }, join)
    }

    pub async fn run(mut self) -> QueueManager {
        info!("BackendActor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                BackendCommand::AddPaths(paths) => {
                    self.handle_add_paths(paths);
                }
                BackendCommand::AddEntry(entry) => {
                    self.queue.add(entry);
                }
                BackendCommand::Remove(index) => {
                    self.queue.remove(index);
                }
                BackendCommand::Clear => {
                    self.queue.clear();
                }
                BackendCommand::ClearCompleted => {
                    self.queue.clear_completed();
                }
                BackendCommand::Select(index) => {
                    self.queue.select(index);
                }
                BackendCommand::Cancel(path) => {
                    let result = self
                        .queue
                        .index_of(&path)
                        .and_then(|i| self.queue.cancel(i));
                    if let Err(e) = result {
                        warn!("Cancel rejected for {:?}: {}", path, e);
                    }
                }
                BackendCommand::Retry(path) => {
                    let result = self
                        .queue
                        .index_of(&path)
                        .and_then(|i| self.queue.reset(i));
                    if let Err(e) = result {
                        warn!("Retry rejected for {:?}: {}", path, e);
                    }
                }
                BackendCommand::Engine(update) => {
                    self.handle_engine_update(update);
                }
                BackendCommand::Snapshot(reply) => {
                    // Receiver may have given up waiting
                    let _ = reply.send(self.queue.snapshot());
                }
                BackendCommand::Shutdown => {
                    info!("BackendActor shutting down");
                    break;
                }
            }
        }

        self.queue
    }

    fn handle_add_paths(&mut self, paths: Vec<PathBuf>) {
        let mut added = 0;
        for path in paths {
            let files = if path.is_dir() {
                scan_folder(&path, self.settings.recursive_scan)
            } else {
                vec![path]
            };

            for file in files {
                match entry_from_path(&file) {
                    Some(entry) => {
                        if self.queue.add(entry) {
                            added += 1;
                        }
                    }
                    None => debug!("Skipping unsupported file {:?}", file),
                }
            }
        }
        info!("Added {} file(s) to queue", added);
    }

    /// Apply a worker report. Lifecycle violations are logged and dropped;
    /// they never stop the backend.
    fn handle_engine_update(&mut self, update: EngineUpdate) {
        let index = match self.queue.index_of(update.path()) {
            Ok(index) => index,
            Err(e) => {
                warn!("Dropping engine update: {}", e);
                return;
            }
        };

        let result = match update {
            EngineUpdate::Started { .. } => self.queue.set_status(index, FileStatus::Encoding),
            EngineUpdate::Progress { progress, .. } => self.queue.set_progress(index, progress),
            EngineUpdate::Finished { .. } => self.queue.set_status(index, FileStatus::Done),
            EngineUpdate::Failed { error, .. } => self.queue.mark_failed(index, error),
            EngineUpdate::Skipped { .. } => self.queue.cancel(index),
            EngineUpdate::Probed { info, .. } => self.queue.set_media_info(index, Some(info)),
        };

        if let Err(e) = result {
            warn!("Engine update rejected: {}", e);
        }
    }
}

impl BackendHandle {
    async fn send(&self, cmd: BackendCommand) -> Result<()> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ForgeError::BackendClosed)
    }

    /// Queue files; folders are scanned for supported files
    pub async fn add_paths(&self, paths: Vec<PathBuf>) -> Result<()> {
        self.send(BackendCommand::AddPaths(paths)).await
    }

    pub async fn add_entry(&self, entry: QueueEntry) -> Result<()> {
        self.send(BackendCommand::AddEntry(entry)).await
    }

    pub async fn remove(&self, index: usize) -> Result<()> {
        self.send(BackendCommand::Remove(index)).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.send(BackendCommand::Clear).await
    }

    pub async fn clear_completed(&self) -> Result<()> {
        self.send(BackendCommand::ClearCompleted).await
    }

    pub async fn select(&self, index: usize) -> Result<()> {
        self.send(BackendCommand::Select(index)).await
    }

    pub async fn cancel(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(BackendCommand::Cancel(path.into())).await
    }

    pub async fn retry(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(BackendCommand::Retry(path.into())).await
    }

    pub async fn report(&self, update: EngineUpdate) -> Result<()> {
        self.send(BackendCommand::Engine(update)).await
    }

    /// For encode workers running on plain threads outside the runtime
    pub fn report_blocking(&self, update: EngineUpdate) -> Result<()> {
        self.sender
            .blocking_send(BackendCommand::Engine(update))
            .map_err(|_| ForgeError::BackendClosed)
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(BackendCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| ForgeError::BackendClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(BackendCommand::Shutdown).await
    }
}
