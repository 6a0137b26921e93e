//! Queued file model

use super::status::FileStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One queued input file and its conversion state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Absolute path; identity key within a queue
    pub path: PathBuf,
    /// Display name
    pub name: String,
    /// Pre-formatted size, e.g. "2.1 GB"
    pub size_label: String,
    /// Pre-formatted duration, e.g. "47m 12s"
    pub duration_label: String,
    pub status: FileStatus,
    /// 0.0 - 1.0, meaningful while encoding
    pub progress: f64,
    /// Populated only while status is `Error`
    pub error_message: String,
    /// Probe output, `None` until a probe has run
    pub media_info: Option<MediaInfo>,
}

impl QueueEntry {
    /// Create a new entry in the `Ready` state
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        size_label: impl Into<String>,
        duration_label: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size_label: size_label.into(),
            duration_label: duration_label.into(),
            status: FileStatus::Ready,
            progress: 0.0,
            error_message: String::new(),
            media_info: None,
        }
    }

    pub fn with_media_info(mut self, info: MediaInfo) -> Self {
        self.media_info = Some(info);
        self
    }
}

/// Stream and container details reported by a media probe.
///
/// Every field is optional because probes commonly fail to report some of
/// them for a given container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub video: Option<VideoStreamInfo>,
    pub container: Option<ContainerInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    /// bits per second
    pub bit_rate: Option<u64>,
    pub bit_depth: Option<u8>,
    pub color_space: Option<String>,
    pub hdr_format: Option<String>,
    pub scan_type: Option<ScanType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Progressive,
    Interlaced,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub format: Option<String>,
    pub duration_secs: Option<f64>,
    pub size_bytes: Option<u64>,
    pub chapters: Option<u32>,
}

impl VideoStreamInfo {
    /// "3840×2160" when both dimensions are known
    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}×{}", w, h)),
            _ => None,
        }
    }
}
