//! Per-restore registry of record factories.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SnapshotError;
use crate::store::BoxedRecord;

/// Converts one raw JSON value into a typed record for one table.
pub type RecordFactory = Box<dyn Fn(Value) -> Result<BoxedRecord, SnapshotError>>;

/// Mapping from table name to the factory that types its records.
///
/// Built fresh by the caller for each restore call and passed by reference;
/// keeping the registry an argument (never process-wide state) is what keeps
/// concurrent restores of different schemas independent.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, RecordFactory>,
}

impl FactoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the deserializable type `T` as the record type of `table`.
    ///
    /// Covers the common case where a table's records are a serde-derived
    /// struct; the factory rejects any raw value that does not match `T`.
    pub fn register<T>(&mut self, table: impl Into<String>)
    where
        T: DeserializeOwned + 'static,
    {
        let table = table.into();
        let for_errors = table.clone();
        self.register_with(table, move |raw| {
            let record: T =
                serde_json::from_value(raw).map_err(|e| SnapshotError::Conversion {
                    table: for_errors.clone(),
                    reason: e.to_string(),
                })?;
            Ok(Box::new(record) as BoxedRecord)
        });
    }

    /// Registers a custom factory closure for `table`.
    pub fn register_with<F>(&mut self, table: impl Into<String>, factory: F)
    where
        F: Fn(Value) -> Result<BoxedRecord, SnapshotError> + 'static,
    {
        self.factories.insert(table.into(), Box::new(factory));
    }

    /// Looks up the factory for `table`.
    pub fn get(&self, table: &str) -> Option<&RecordFactory> {
        self.factories.get(table)
    }

    /// Returns true if a factory is registered for `table`.
    pub fn contains(&self, table: &str) -> bool {
        self.factories.contains_key(table)
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
