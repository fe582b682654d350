//! In-memory record store
//!
//! Holds the collection behind a lock and hands out clones, so callers see the
//! same copy-in/copy-out semantics as the file store.

use parking_lot::RwLock;

use crate::core::{Collection, Record, StorageError};
use super::RecordStore;

/// Process-local [`RecordStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Collection>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`
    pub fn with_records(records: Collection) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Collection, StorageError> {
        Ok(self.records.read().clone())
    }

    fn save(&self, records: &[Record]) -> Result<(), StorageError> {
        *self.records.write() = records.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
