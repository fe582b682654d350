//! Error types and handling for the user records service
//!
//! Storage failures are fatal to the request that hit them, validation failures
//! reject the request as a client error. Looking up a missing record is not an
//! error at all and never shows up here.

use std::path::Path;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted collection could not be loaded or saved
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Malformed request payload
    #[error("{0}")]
    Validation(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Document missing, unreadable, or not a JSON array of objects
    #[error("Failed to read collection from {path}: {reason}")]
    Read {
        /// Location of the persisted document
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Document could not be encoded or written back
    #[error("Failed to write collection to {path}: {reason}")]
    Write {
        /// Location of the persisted document
        path: String,
        /// What went wrong
        reason: String,
    },
}

impl StorageError {
    /// Create a read error for the given location
    pub fn read(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Read {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a write error for the given location
    pub fn write(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}
