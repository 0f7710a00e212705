//! Restore loader: token-level streaming parse of a snapshot document into
//! one all-or-nothing transaction.


use std::fmt;
use std::io::{self, Read};

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::registry::FactoryRegistry;
use crate::store::WriteTxn;

/// Loads a snapshot document from `source` into `txn`, atomically.
///
/// An absent source, or a source with no bytes (whitespace only counts as
/// empty), is a no-op success so first-run callers need no "does a snapshot
/// exist yet" branch. Otherwise the document is parsed token by token, never
/// materialized as a whole: each table name is resolved against `factories`
/// and each array element is decoded as one raw JSON value, typed by the
/// table's factory, and inserted into `txn`. Tables load in document order;
/// records load in array order.
///
/// `txn` commits exactly once, after the entire document has been consumed.
/// The first error of any class (malformed JSON, a missing factory, a factory
/// rejection, an insert failure) aborts the transaction, so either every
/// record from every table becomes visible or none do. The loader never clears
/// destination tables; restoring into a non-empty store surfaces the
/// transaction's own insert semantics for colliding keys.
///
/// # Arguments
/// * `source` - Byte source holding the document, or `None`
/// * `txn` - Transaction scoped to this restore
/// * `factories` - Per-call registry mapping table name to record factory
///
/// # Returns
/// `Result<(), SnapshotError>` - `Ok` once the transaction has committed (or
/// there was nothing to restore), otherwise the first error encountered.
pub fn load_snapshot<R, T>(
    source: Option<R>,
    txn: T,
    factories: &FactoryRegistry,
) -> Result<(), SnapshotError>
where
    R: Read,
    T: WriteTxn,
{
    let Some(mut reader) = source else {
        tracing::debug!("No snapshot source, nothing to restore");
        txn.abort();
        return Ok(());
    };

    // Peek past leading whitespace; a blank stream means "nothing to restore",
    // not a parse error.
    let first = match first_significant_byte(&mut reader) {
        Ok(Some(first)) => first,
        Ok(None) => {
            tracing::debug!("Empty snapshot source, nothing to restore");
            txn.abort();
            return Ok(());
        }
        Err(e) => {
            txn.abort();
            return Err(e);
        }
    };

    let mut txn = txn;
    let mut failure = None;
    let reader = io::Cursor::new([first]).chain(reader);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);

    let seed = DocumentSeed {
        txn: &mut txn,
        factories,
        failure: &mut failure,
    };
    // Trailing bytes after the closing delimiter are a format error.
    let parsed = match seed.deserialize(&mut deserializer) {
        Ok(()) => deserializer.end(),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(()) => {
            txn.commit()?;
            tracing::debug!("Snapshot restore committed");
            Ok(())
        }
        Err(parse_error) => {
            txn.abort();
            // Domain errors raised inside the visitors travel through serde
            // as opaque custom errors; the stashed original takes precedence.
            Err(failure.unwrap_or_else(|| classify_parse_error(parse_error)))
        }
    }
}

/// Reads up to the first non-whitespace byte, or `None` at end of input.
fn first_significant_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, SnapshotError> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) if buf[0].is_ascii_whitespace() => continue,
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SnapshotError::Io(format!("Failed to read snapshot: {}", e)));
            }
        }
    }
}

fn classify_parse_error(error: serde_json::Error) -> SnapshotError {
    if error.is_io() {
        SnapshotError::Io(format!("Failed to read snapshot: {}", error))
    } else {
        SnapshotError::Format(error.to_string())
    }
}

/// Seed for the top-level document: a map of table name to record array.
///
/// Table sections are processed as the keys stream in; nothing beyond the
/// record currently being decoded is held in memory.
struct DocumentSeed<'a, T> {
    txn: &'a mut T,
    factories: &'a FactoryRegistry,
    failure: &'a mut Option<SnapshotError>,
}

impl<'de, 'a, T: WriteTxn> DeserializeSeed<'de> for DocumentSeed<'a, T> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a, T: WriteTxn> Visitor<'de> for DocumentSeed<'a, T> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a snapshot object keyed by table name")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(table) = map.next_key::<String>()? {
            let Some(factory) = self.factories.get(&table) else {
                *self.failure = Some(SnapshotError::MissingFactory(table));
                return Err(de::Error::custom("missing record factory"));
            };

            let count = map.next_value_seed(TableSeed {
                table: &table,
                factory,
                txn: &mut *self.txn,
                failure: &mut *self.failure,
            })?;
            tracing::debug!("Restored {} records into table '{}'", count, table);
        }
        Ok(())
    }
}

/// Seed for one table section: an array of raw records, decoded one element
/// at a time, typed by the table's factory, and inserted into the transaction.
struct TableSeed<'a, T> {
    table: &'a str,
    factory: &'a crate::registry::RecordFactory,
    txn: &'a mut T,
    failure: &'a mut Option<SnapshotError>,
}

impl<'de, 'a, T: WriteTxn> DeserializeSeed<'de> for TableSeed<'a, T> {
    type Value = u64;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a, T: WriteTxn> Visitor<'de> for TableSeed<'a, T> {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0u64;
        while let Some(raw) = seq.next_element::<Value>()? {
            let record = match (self.factory)(raw) {
                Ok(record) => record,
                Err(e) => {
                    *self.failure = Some(e);
                    return Err(de::Error::custom("record conversion failed"));
                }
            };
            if let Err(e) = self.txn.insert(self.table, record) {
                *self.failure = Some(e);
                return Err(de::Error::custom("record insert failed"));
            }
            count += 1;
        }
        Ok(count)
    }
}
