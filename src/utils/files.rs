//! File intake: extension filtering, size labels and folder scanning

use crate::queue::QueueEntry;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Container extensions accepted into the queue (lower case, no dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "m4v", "flv", "wmv", "ts", "m2ts", "mpg", "mpeg", "ogv",
    "3gp",
];

/// Placeholder shown until a probe reports the real duration
pub const UNKNOWN_DURATION: &str = "—";

/// Placeholder shown when the file size cannot be read
pub const UNKNOWN_SIZE: &str = "? MB";

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Human-readable size with one decimal, e.g. `"2.1 GB"`
pub fn friendly_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Size label for a file on disk, or a placeholder if it can't be read
pub fn size_label(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) => friendly_size(meta.len()),
        Err(e) => {
            debug!("Could not read size of {:?}: {}", path, e);
            UNKNOWN_SIZE.to_string()
        }
    }
}

/// Short upper-case extension badge, at most four characters
pub fn friendly_ext(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_uppercase().chars().take(4).collect())
        .unwrap_or_default()
}

/// Build a `Ready` entry for a supported file. Unsupported files yield `None`.
pub fn entry_from_path(path: &Path) -> Option<QueueEntry> {
    if !is_supported(path) {
        return None;
    }

    let path: PathBuf = match path.absolutize() {
        Ok(abs) => abs.into_owned(),
        Err(_) => path.to_path_buf(),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let size = size_label(&path);

    Some(QueueEntry::new(path, name, size, UNKNOWN_DURATION))
}

/// Supported files under `dir`, sorted by path.
///
/// Unreadable directory entries are skipped.
pub fn scan_folder(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files
}
