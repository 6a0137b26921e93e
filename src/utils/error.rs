//! Error handling for Forge

use crate::queue::FileStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Forge
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Index {index} out of range for queue of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Entry not found: {0}")]
    EntryNotFound(PathBuf),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: FileStatus, to: FileStatus },

    #[error("Progress can only be reported while encoding (status is {0})")]
    NotEncoding(FileStatus),

    #[error("Invalid progress value: {0}")]
    InvalidProgress(f64),

    #[error("Backend is not running")]
    BackendClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
