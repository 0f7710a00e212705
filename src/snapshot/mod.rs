//! Snapshot writer: streams every table of a read view as one JSON document.


use std::io::Write;

use crate::error::SnapshotError;
use crate::store::ReadView;

/// Streams all `tables` of `view` to `sink` as a single JSON object.
///
/// Emits `{"<table>": [<record>,...],...}` with tables in the order given and
/// records in each table's primary-index order. Only one record is buffered at
/// a time, so memory stays flat for arbitrarily large tables. Table order must
/// come from a stable schema enumeration so repeated snapshots of the same
/// state are byte-identical.
///
/// `view` must be an isolated point-in-time view; isolation is the storage
/// engine's guarantee, not checked here.
///
/// # Arguments
/// * `sink` - Byte sink receiving the document
/// * `view` - Isolated read view over all tables
/// * `tables` - Table names to emit, in stable schema order
///
/// # Returns
/// `Result<(), SnapshotError>` - the first scan, marshal, or sink error
/// aborts the write. On error the sink holds a malformed prefix and must be
/// discarded wholesale by the caller.
pub fn write_snapshot<W, V>(mut sink: W, view: &V, tables: &[String]) -> Result<(), SnapshotError>
where
    W: Write,
    V: ReadView + ?Sized,
{
    sink.write_all(b"{").map_err(sink_error)?;

    for (index, table) in tables.iter().enumerate() {
        if index > 0 {
            sink.write_all(b",").map_err(sink_error)?;
        }

        // Table names pass through the JSON string escaper; record text is
        // already marshaled by the view.
        let key = serde_json::to_string(table)
            .map_err(|e| SnapshotError::Storage(format!("Failed to marshal table name: {}", e)))?;
        sink.write_all(key.as_bytes()).map_err(sink_error)?;
        sink.write_all(b": [").map_err(sink_error)?;

        let mut record_count = 0u64;
        for record in view.scan(table)? {
            let record = record?;
            if record_count > 0 {
                sink.write_all(b",").map_err(sink_error)?;
            }
            sink.write_all(record.as_bytes()).map_err(sink_error)?;
            record_count += 1;
        }

        sink.write_all(b"]").map_err(sink_error)?;
        tracing::debug!("Wrote {} records for table '{}'", record_count, table);
    }

    sink.write_all(b"}").map_err(sink_error)?;
    tracing::debug!("Snapshot write completed for {} tables", tables.len());

    Ok(())
}

fn sink_error(error: std::io::Error) -> SnapshotError {
    SnapshotError::Io(format!("Failed to write snapshot: {}", error))
}
