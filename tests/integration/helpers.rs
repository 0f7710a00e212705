//! Shared in-memory store fixture for the integration suite.
//!
//! A two-table store (`message` and `counter`, both uniquely keyed by `name`)
//! standing in for the external storage engine: the store itself is the
//! isolated read view (tests are single-threaded, so no copy is needed), and
//! [`MemTxn`] is a staged transaction with reject-on-duplicate insert
//! semantics so the abort paths get exercised.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use memsnap::{BoxedRecord, FactoryRegistry, ReadView, RecordIter, SnapshotError, WriteTxn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub count: u64,
}

/// In-memory two-table store; BTreeMap keys double as the primary index.
#[derive(Debug, Default, PartialEq)]
pub struct MemStore {
    pub messages: BTreeMap<String, Message>,
    pub counters: BTreeMap<String, Counter>,
}

impl MemStore {
    pub fn shared() -> Rc<RefCell<MemStore>> {
        Rc::new(RefCell::new(MemStore::default()))
    }

    pub fn insert_message(&mut self, name: &str, text: &str) {
        self.messages.insert(
            name.to_string(),
            Message {
                name: name.to_string(),
                text: text.to_string(),
            },
        );
    }

    pub fn insert_counter(&mut self, name: &str, count: u64) {
        self.counters.insert(
            name.to_string(),
            Counter {
                name: name.to_string(),
                count,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.counters.is_empty()
    }
}

/// Stable schema enumeration used by every snapshot in the suite.
pub fn table_names() -> Vec<String> {
    vec!["counter".to_string(), "message".to_string()]
}

/// Factory registry covering both fixture tables.
pub fn registry() -> FactoryRegistry {
    let mut factories = FactoryRegistry::new();
    factories.register::<Message>("message");
    factories.register::<Counter>("counter");
    factories
}

fn marshal<T: Serialize>(record: &T) -> Result<String, SnapshotError> {
    serde_json::to_string(record)
        .map_err(|e| SnapshotError::Storage(format!("Failed to marshal record: {}", e)))
}

impl ReadView for MemStore {
    fn scan(&self, table: &str) -> Result<RecordIter<'_>, SnapshotError> {
        match table {
            "message" => Ok(Box::new(self.messages.values().map(marshal))),
            "counter" => Ok(Box::new(self.counters.values().map(marshal))),
            other => Err(SnapshotError::Storage(format!(
                "Unknown table '{}'",
                other
            ))),
        }
    }
}

/// Staged transaction over a shared [`MemStore`].
///
/// Inserts are invisible until commit; duplicate keys (against committed or
/// staged state) are rejected the way a unique index would.
pub struct MemTxn {
    store: Rc<RefCell<MemStore>>,
    staged: MemStore,
}

impl MemTxn {
    pub fn new(store: Rc<RefCell<MemStore>>) -> Self {
        Self {
            store,
            staged: MemStore::default(),
        }
    }
}

impl WriteTxn for MemTxn {
    fn insert(&mut self, table: &str, record: BoxedRecord) -> Result<(), SnapshotError> {
        match table {
            "message" => {
                let message = record.downcast::<Message>().map_err(|_| {
                    SnapshotError::Storage("wrong record type for table 'message'".to_string())
                })?;
                let taken = self.store.borrow().messages.contains_key(&message.name)
                    || self.staged.messages.contains_key(&message.name);
                if taken {
                    return Err(SnapshotError::Storage(format!(
                        "Unique key violation in table 'message': '{}'",
                        message.name
                    )));
                }
                self.staged.messages.insert(message.name.clone(), *message);
            }
            "counter" => {
                let counter = record.downcast::<Counter>().map_err(|_| {
                    SnapshotError::Storage("wrong record type for table 'counter'".to_string())
                })?;
                let taken = self.store.borrow().counters.contains_key(&counter.name)
                    || self.staged.counters.contains_key(&counter.name);
                if taken {
                    return Err(SnapshotError::Storage(format!(
                        "Unique key violation in table 'counter': '{}'",
                        counter.name
                    )));
                }
                self.staged.counters.insert(counter.name.clone(), *counter);
            }
            other => {
                return Err(SnapshotError::Storage(format!(
                    "Unknown table '{}'",
                    other
                )));
            }
        }
        Ok(())
    }

    fn commit(self) -> Result<(), SnapshotError> {
        let mut store = self.store.borrow_mut();
        store.messages.extend(self.staged.messages);
        store.counters.extend(self.staged.counters);
        Ok(())
    }

    fn abort(self) {
        // Staged state drops here; the shared store is untouched.
    }
}

/// Snapshots `store` to a string using the fixture schema order.
pub fn snapshot_to_string(store: &MemStore) -> String {
    let mut out = Vec::new();
    memsnap::write_snapshot(&mut out, store, &table_names()).unwrap();
    String::from_utf8(out).unwrap()
}
