//! File-backed snapshot save and restore.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use crate::config::SnapshotConfig;
use crate::error::SnapshotError;
use crate::registry::FactoryRegistry;
use crate::restore::load_snapshot;
use crate::snapshot::write_snapshot;
use crate::store::{ReadView, WriteTxn};

/// Wires the streaming writer and loader to a snapshot file.
///
/// Adds no format semantics of its own: `save` is [`write_snapshot`] into a
/// temporary file followed by an atomic rename, `restore` is [`load_snapshot`]
/// from the file with a missing file treated as the absent-source no-op.
#[derive(Debug)]
pub struct SnapshotManager {
    /// Snapshot file path
    snapshot_path: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

impl SnapshotManager {
    /// Creates a new snapshot manager with the given configuration.
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            snapshot_path: config.snapshot_path.clone(),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// Streams `tables` of `view` into the snapshot file, atomically.
    ///
    /// The document is written to `<path>.tmp`, synced, then renamed onto the
    /// configured path, so a failed save never clobbers the previous
    /// snapshot. Transient I/O errors retry whole save attempts up to the
    /// configured limit.
    ///
    /// # Arguments
    /// * `view` - Isolated read view over all tables
    /// * `tables` - Table names to emit, in stable schema order
    ///
    /// # Returns
    /// `Result<(), SnapshotError>` indicating success or failure.
    pub fn save<V>(&self, view: &V, tables: &[String]) -> Result<(), SnapshotError>
    where
        V: ReadView + ?Sized,
    {
        let mut attempt = 0;
        loop {
            match self.save_once(view, tables) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(err);
                    }
                    // Only transient I/O errors are worth retrying.
                    if let SnapshotError::TransientIo(_) = err {
                        tracing::warn!(
                            "Transient I/O error saving snapshot (attempt {}/{}): {}",
                            attempt,
                            self.max_retries,
                            err
                        );
                        if self.retry_delay_ms > 0 {
                            std::thread::sleep(std::time::Duration::from_millis(
                                self.retry_delay_ms,
                            ));
                        }
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    fn save_once<V>(&self, view: &V, tables: &[String]) -> Result<(), SnapshotError>
    where
        V: ReadView + ?Sized,
    {
        if let Some(parent) = self.snapshot_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| classify_io_error(e, "Failed to create snapshot directory"))?;
            }
        }

        let temp_path = self.temp_path();
        let file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp snapshot file"))?;

        let mut writer = BufWriter::new(&file);
        write_snapshot(&mut writer, view, tables)?;
        writer
            .flush()
            .map_err(|e| classify_io_error(e, "Failed to flush snapshot"))?;
        drop(writer);

        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))?;

        // Atomic rename
        fs::rename(&temp_path, &self.snapshot_path)
            .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))?;

        tracing::debug!(
            "Snapshot saved to {} ({} tables)",
            self.snapshot_path.display(),
            tables.len()
        );
        Ok(())
    }

    /// Loads the snapshot file into `txn`, atomically.
    ///
    /// A missing file means there is nothing to restore and succeeds without
    /// touching the store.
    ///
    /// # Arguments
    /// * `txn` - Transaction scoped to this restore
    /// * `factories` - Per-call registry mapping table name to record factory
    ///
    /// # Returns
    /// `Result<(), SnapshotError>` indicating success or failure.
    pub fn restore<T>(&self, txn: T, factories: &FactoryRegistry) -> Result<(), SnapshotError>
    where
        T: WriteTxn,
    {
        match File::open(&self.snapshot_path) {
            Ok(file) => load_snapshot(Some(BufReader::new(file)), txn, factories),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "No snapshot file at {}, nothing to restore",
                    self.snapshot_path.display()
                );
                load_snapshot(None::<BufReader<File>>, txn, factories)
            }
            Err(e) => Err(classify_io_error(e, "Failed to open snapshot file")),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.snapshot_path.as_os_str().to_owned();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

/// Classifies I/O errors into specific SnapshotError variants.
fn classify_io_error(error: std::io::Error, context: &str) -> SnapshotError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            SnapshotError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            SnapshotError::TransientIo(format!("{}: {}", context, error))
        }
        _ => SnapshotError::Io(format!("{}: {}", context, error)),
    }
}
