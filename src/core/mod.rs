//! Core system types and foundations
//!
//! This module contains the record type, error handling, and configuration
//! shared by the storage, records, and API layers.

pub mod types;
pub mod error;
pub mod config;

// Re-export commonly used items
pub use types::{Collection, Fields, Record, ID_KEY};
pub use error::{Error, Result, StorageError};
pub use config::{BulkFlush, Config, OrderingPolicy};
