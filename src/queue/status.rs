//! Entry status lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of a queued file.
///
/// `Ready` is the initial state. `Done`, `Error` and `Skipped` are terminal;
/// the only way out of a terminal state is an explicit reset back to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Ready,
    Encoding,
    Done,
    Error,
    Skipped,
}

impl FileStatus {
    pub const ALL: [FileStatus; 5] = [
        FileStatus::Ready,
        FileStatus::Encoding,
        FileStatus::Done,
        FileStatus::Error,
        FileStatus::Skipped,
    ];

    pub fn is_terminal(self) -> bool {
        match self {
            FileStatus::Ready | FileStatus::Encoding => false,
            FileStatus::Done | FileStatus::Error | FileStatus::Skipped => true,
        }
    }

    /// Whether an encode driver may move an entry from `self` to `next`.
    ///
    /// Staying in the same state is not a transition and returns `false`.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        match (self, next) {
            (FileStatus::Ready, FileStatus::Encoding) => true,
            (FileStatus::Ready, FileStatus::Skipped) => true,
            (FileStatus::Encoding, FileStatus::Done) => true,
            (FileStatus::Encoding, FileStatus::Error) => true,
            (FileStatus::Encoding, FileStatus::Skipped) => true,
            (from, FileStatus::Ready) => from.is_terminal(),
            _ => false,
        }
    }

    /// Short label for list rows
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Ready => "Ready",
            FileStatus::Encoding => "Encoding",
            FileStatus::Done => "Done",
            FileStatus::Error => "Error",
            FileStatus::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
