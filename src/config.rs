//! Snapshot file configuration.

use std::path::PathBuf;

/// Configuration for the file-backed snapshot manager.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Path of the snapshot document
    pub snapshot_path: PathBuf,
    /// Maximum retry attempts for transient I/O errors during save
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./data/snapshot.json"),
            max_retries: 3,      // Default retry attempts
            retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}
