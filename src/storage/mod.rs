//! Storage layer for the user records service
//!
//! The collection is always moved as a whole: [`RecordStore::load`] returns every
//! record in stored order and [`RecordStore::save`] replaces every record. There
//! is no partial I/O, no index and no cache between requests.

use crate::core::{Collection, Record, StorageError};

/// Whole-collection persistence contract
///
/// Implementations must round-trip order and content exactly: `save(&load()?)`
/// leaves the persisted collection semantically unchanged.
pub trait RecordStore: Send + Sync + 'static {
    /// Read the full collection in stored order
    fn load(&self) -> Result<Collection, StorageError>;

    /// Replace the persisted collection with `records`
    fn save(&self, records: &[Record]) -> Result<(), StorageError>;

    /// Short human-readable description of the backend, used in logs and `/health`
    fn describe(&self) -> String;
}

/// Single JSON document on local disk
pub mod json_file;

/// Process-local store
pub mod memory;

/// Backend selection from configuration
pub mod factory;

pub use factory::{create_store, Backend};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
