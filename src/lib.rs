//! Streaming JSON snapshot and restore for in-memory multi-table databases.
//!
//! Walks every table of an isolated read view and streams the whole database
//! as one JSON document, and loads such a document back through caller-supplied
//! record factories inside a single all-or-nothing transaction. The storage
//! engine itself (tables, indexes, isolation) stays behind the traits in
//! [`store`]; this crate never materializes more than one record at a time.

pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod restore;
pub mod snapshot;
pub mod store;

pub use config::SnapshotConfig;
pub use error::SnapshotError;
pub use manager::SnapshotManager;
pub use registry::FactoryRegistry;
pub use restore::load_snapshot;
pub use snapshot::write_snapshot;
pub use store::{BoxedRecord, ReadView, RecordIter, WriteTxn};
