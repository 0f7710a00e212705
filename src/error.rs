//! Snapshot and restore error types.

use thiserror::Error;

/// Errors raised while writing or restoring a snapshot document.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Malformed snapshot document
    #[error("Malformed snapshot document: {0}")]
    Format(String),

    /// Table present in the document with no registered factory
    #[error("No record factory registered for table '{0}'")]
    MissingFactory(String),

    /// A factory rejected a raw record
    #[error("Record conversion failed for table '{table}': {reason}")]
    Conversion { table: String, reason: String },

    /// Insert, commit, scan, or marshal failure in the backing store
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error while reading or writing a snapshot
    #[error("I/O error: {0}")]
    Io(String),

    /// Disk full while writing a snapshot file
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIo(String),
}
