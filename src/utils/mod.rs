//! Configuration, errors and file intake helpers

pub mod config;
pub mod error;
pub mod files;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{ForgeError, Result};
pub use files::{entry_from_path, friendly_ext, friendly_size, is_supported, scan_folder};
