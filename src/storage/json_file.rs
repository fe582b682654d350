//! JSON document store
//!
//! The collection lives in one file as a 2-space-indented JSON array. Saves go
//! to a sibling temp file which is then renamed over the document, so a reader
//! observes either the previous collection or the new one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::{Collection, Record, StorageError};
use super::RecordStore;

/// File-backed [`RecordStore`]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    sync_writes: bool,
}

impl JsonFileStore {
    /// Store backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_writes: true,
        }
    }

    /// Whether to fsync the temp file before it replaces the document
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Location of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create parent directories and seed an empty collection when the document is absent.
    ///
    /// Returns `true` if a new document was written.
    pub fn ensure_exists(&self) -> Result<bool, StorageError> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::write(&self.path, e))?;
        }

        self.save(&[])?;
        tracing::info!("Seeded empty collection at {}", self.path.display());
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<Collection, StorageError> {
        let contents =
            fs::read_to_string(&self.path).map_err(|e| StorageError::read(&self.path, e))?;

        let records: Collection =
            serde_json::from_str(&contents).map_err(|e| StorageError::read(&self.path, e))?;

        tracing::trace!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save(&self, records: &[Record]) -> Result<(), StorageError> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(|e| StorageError::write(&self.path, e))?;

        let temp_path = self.temp_path();
        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            if self.sync_writes {
                file.sync_all()?;
            }
            Ok(())
        };

        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::write(&self.path, e));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::write(&self.path, e)
        })?;

        tracing::trace!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
