//! Storage factory for creating storage implementations based on configuration

use crate::core::config::{StorageConfig, StorageType};
use crate::core::{Collection, Record, Result, StorageError};
use super::{JsonFileStore, MemoryStore, RecordStore};

/// Configured storage backend
#[derive(Debug)]
pub enum Backend {
    /// JSON document on disk
    File(JsonFileStore),
    /// Process-local collection
    Memory(MemoryStore),
}

impl RecordStore for Backend {
    fn load(&self) -> std::result::Result<Collection, StorageError> {
        match self {
            Backend::File(store) => store.load(),
            Backend::Memory(store) => store.load(),
        }
    }

    fn save(&self, records: &[Record]) -> std::result::Result<(), StorageError> {
        match self {
            Backend::File(store) => store.save(records),
            Backend::Memory(store) => store.save(records),
        }
    }

    fn describe(&self) -> String {
        match self {
            Backend::File(store) => store.describe(),
            Backend::Memory(store) => store.describe(),
        }
    }
}

/// Create a storage implementation based on configuration
///
/// For the file backend with `create_if_missing`, an absent document is seeded
/// with an empty collection here, once, before any request is served.
pub fn create_store(config: &StorageConfig) -> Result<Backend> {
    match config.backend {
        StorageType::File => {
            let store = JsonFileStore::new(&config.data_file).with_sync_writes(config.sync_writes);
            if config.create_if_missing {
                store.ensure_exists()?;
            } else if !store.path().exists() {
                tracing::warn!(
                    "Data file {} does not exist; requests will fail until it is created",
                    store.path().display()
                );
            }
            Ok(Backend::File(store))
        }
        StorageType::Memory => Ok(Backend::Memory(MemoryStore::new())),
    }
}
