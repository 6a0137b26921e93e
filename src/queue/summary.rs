//! Aggregate queue status for progress displays

use super::entry::QueueEntry;
use super::status::FileStatus;
use std::fmt;

/// What a progress footer should show for the current queue
#[derive(Debug, Clone, PartialEq)]
pub enum QueueSummary {
    /// Nothing queued
    Idle,
    /// An entry is being encoded
    Encoding {
        name: String,
        progress: f64,
        done: usize,
        total: usize,
    },
    /// Every entry finished successfully
    AllDone { done: usize },
    /// Work remains but nothing is encoding
    Pending {
        ready: usize,
        done: usize,
        total: usize,
    },
}

impl QueueSummary {
    pub fn from_entries(entries: &[QueueEntry]) -> Self {
        let total = entries.len();
        let done = entries
            .iter()
            .filter(|e| e.status == FileStatus::Done)
            .count();

        if let Some(current) = entries.iter().find(|e| e.status == FileStatus::Encoding) {
            return QueueSummary::Encoding {
                name: current.name.clone(),
                progress: current.progress,
                done,
                total,
            };
        }
        if total == 0 {
            return QueueSummary::Idle;
        }
        if done == total {
            return QueueSummary::AllDone { done };
        }

        let ready = entries
            .iter()
            .filter(|e| e.status == FileStatus::Ready)
            .count();
        QueueSummary::Pending { ready, done, total }
    }

    /// Progress bar value in `[0.0, 1.0]`
    pub fn fraction(&self) -> f64 {
        match self {
            QueueSummary::Idle => 0.0,
            QueueSummary::Encoding { progress, .. } => *progress,
            QueueSummary::AllDone { .. } => 1.0,
            QueueSummary::Pending { done, total, .. } => {
                if *total == 0 {
                    0.0
                } else {
                    *done as f64 / *total as f64
                }
            }
        }
    }

    /// Whole-number percentage while encoding
    pub fn percent_label(&self) -> Option<String> {
        match self {
            QueueSummary::Encoding { progress, .. } => {
                Some(format!("{}%", (progress * 100.0) as u32))
            }
            QueueSummary::AllDone { .. } => Some("100%".to_string()),
            QueueSummary::Idle | QueueSummary::Pending { .. } => None,
        }
    }
}

impl fmt::Display for QueueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueSummary::Idle => write!(f, "Ready - add files to the queue"),
            QueueSummary::Encoding {
                name, done, total, ..
            } => write!(f, "Encoding {} - {}/{} complete", name, done, total),
            QueueSummary::AllDone { done } => {
                write!(f, "All done - {} file(s) converted", done)
            }
            QueueSummary::Pending { ready, done, .. } => {
                write!(f, "{} file(s) queued, {} done", ready, done)
            }
        }
    }
}
