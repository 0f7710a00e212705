//! Collaborator seams into the backing storage engine.
//!
//! The snapshot writer only needs an isolated read view it can scan table by
//! table; the restore loader only needs a transaction it can insert into and
//! commit or abort as a whole. Everything else about the engine (table
//! definitions, indexing, isolation) stays on the engine's side of these
//! traits.

use std::any::Any;

use crate::error::SnapshotError;

/// A typed record as produced by a factory and consumed by a transaction.
///
/// The crate never inspects record fields; the transaction downcasts back to
/// the concrete type it shares with the factory that built the record.
pub type BoxedRecord = Box<dyn Any>;

/// One table's record stream, in primary-index order.
///
/// Each item is a single record already marshaled to its JSON object text.
/// Marshaling happens on the view's side of the seam, where the concrete
/// record type is known, so a derived struct serializes with its declared
/// field order and the emitted document stays deterministic.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<String, SnapshotError>> + 'a>;

/// An isolated, point-in-time read view of the database.
///
/// Implementations must guarantee that concurrent mutations to the live
/// database are invisible to every scan for the lifetime of the view, so one
/// snapshot operation observes a single consistent state.
pub trait ReadView {
    /// Iterates all records of `table` in primary-key order.
    ///
    /// # Arguments
    /// * `table` - Table name
    ///
    /// # Returns
    /// `Result<RecordIter, SnapshotError>` with the table's record stream,
    /// or a storage error if the table cannot be scanned.
    fn scan(&self, table: &str) -> Result<RecordIter<'_>, SnapshotError>;
}

/// A writable transaction scoped to one whole restore.
///
/// Inserts are staged until [`commit`](WriteTxn::commit); [`abort`](WriteTxn::abort)
/// discards every staged insert. The loader does not clear tables before
/// inserting: restore is intended for an empty destination, and colliding
/// keys surface whatever insert semantics the engine has (typically a
/// uniqueness rejection, which aborts the restore).
pub trait WriteTxn {
    /// Stages one typed record for insertion into `table`.
    fn insert(&mut self, table: &str, record: BoxedRecord) -> Result<(), SnapshotError>;

    /// Makes every staged insert visible atomically.
    fn commit(self) -> Result<(), SnapshotError>;

    /// Discards every staged insert.
    fn abort(self);
}
