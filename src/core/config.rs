//! Configuration for the user records service
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file,
//! environment variables, and command line flags (applied by the binary).

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Config file picked up by [`Config::load`] when present
pub const DEFAULT_CONFIG_FILE: &str = "user-records.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Record operation policies
    pub records: RecordsConfig,

    /// Cross-origin access
    pub cors: CorsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,
}

/// Available storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    /// Whole collection persisted as one JSON document
    File,
    /// Process-local collection, lost on exit
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageType,

    /// Path of the JSON document holding the collection
    pub data_file: PathBuf,

    /// Seed an empty collection at startup when the document is absent
    pub create_if_missing: bool,

    /// fsync the document before it replaces the previous version
    pub sync_writes: bool,
}

/// Where new records go and which neighbour their id follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingPolicy {
    /// Prepend new records; the listing reads newest to oldest
    NewestFirst,
    /// Append new records; the listing reads oldest to newest
    OldestFirst,
}

/// When bulk creation persists the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulkFlush {
    /// Save after every inserted record
    EveryItem,
    /// Save once after the whole batch
    OnceAtEnd,
}

/// Record operation policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Route prefix of the collection, e.g. `/api/users`
    pub base_path: String,

    /// Insertion order for create and bulk-create
    pub ordering: OrderingPolicy,

    /// Persistence cadence for bulk-create
    pub bulk_flush: BulkFlush,
}

/// Cross-origin access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origin patterns; `*` stands for one or more subdomain labels
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageType::File,
            data_file: PathBuf::from("./data/users.json"),
            create_if_missing: true,
            sync_writes: true,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            base_path: "/api/users".to_string(),
            ordering: OrderingPolicy::NewestFirst,
            bulk_flush: BulkFlush::EveryItem,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://*.myshopify.com".to_string(),
                "https://admin.shopify.com".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            _ => Err(Error::config(format!(
                "Invalid storage backend: {}. Valid options: file, memory",
                s
            ))),
        }
    }
}

impl FromStr for OrderingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "newest-first" => Ok(Self::NewestFirst),
            "oldest-first" => Ok(Self::OldestFirst),
            _ => Err(Error::config(format!(
                "Invalid ordering: {}. Valid options: newest-first, oldest-first",
                s
            ))),
        }
    }
}

impl FromStr for BulkFlush {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "every-item" => Ok(Self::EveryItem),
            "once-at-end" => Ok(Self::OnceAtEnd),
            _ => Err(Error::config(format!(
                "Invalid bulk flush mode: {}. Valid options: every-item, once-at-end",
                s
            ))),
        }
    }
}

impl Config {
    /// Load configuration from the default file (if any) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(port) = env::var("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|e| Error::config(format!("Invalid PORT: {}", e)))?;
            self.server.http_addr.set_port(port);
        }

        if let Ok(addr) = env::var("UR_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(data_file) = env::var("UR_DATA_FILE") {
            self.storage.data_file = PathBuf::from(data_file);
        }

        if let Ok(ordering) = env::var("UR_ORDERING") {
            self.records.ordering = ordering.parse()?;
        }

        if let Ok(flush) = env::var("UR_BULK_FLUSH") {
            self.records.bulk_flush = flush.parse()?;
        }

        if let Ok(level) = env::var("UR_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("UR_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = &self.records.base_path;
        if !base.starts_with('/') || (base.len() > 1 && base.ends_with('/')) {
            return Err(Error::config(format!(
                "Invalid base path {:?}: must start with '/' and not end with '/'",
                base
            )));
        }
        if base.len() < 2 {
            return Err(Error::config("Base path cannot be the root path"));
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::config("At least one allowed origin is required"));
        }
        if let Some(bad) = self.cors.allowed_origins.iter().find(|o| o.matches('*').count() > 1) {
            return Err(Error::config(format!(
                "Invalid origin pattern {:?}: at most one '*' is allowed",
                bad
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.http_addr.port(), 3000);
        assert_eq!(config.records.base_path, "/api/users");
        assert_eq!(config.records.ordering, OrderingPolicy::NewestFirst);
        assert_eq!(config.records.bulk_flush, BulkFlush::EveryItem);
        assert_eq!(config.storage.data_file, PathBuf::from("./data/users.json"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [records]
            ordering = "oldest-first"
            bulk_flush = "once-at-end"

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.records.ordering, OrderingPolicy::OldestFirst);
        assert_eq!(config.records.bulk_flush, BulkFlush::OnceAtEnd);
        assert_eq!(config.records.base_path, "/api/users");
        assert_eq!(config.storage.backend, StorageType::Memory);
        assert!(config.storage.sync_writes);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = Config::from_toml_str("[records]\nordering = \"sideways\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!("sideways".parse::<OrderingPolicy>().is_err());
        assert_eq!(
            "oldest-first".parse::<OrderingPolicy>().unwrap(),
            OrderingPolicy::OldestFirst
        );
    }

    #[test]
    fn test_validate_base_path() {
        let mut config = Config::default();
        config.records.base_path = "api/users".to_string();
        assert!(config.validate().is_err());

        config.records.base_path = "/api/users/".to_string();
        assert!(config.validate().is_err());

        config.records.base_path = "/".to_string();
        assert!(config.validate().is_err());

        config.records.base_path = "/users".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_logging_and_origins() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cors.allowed_origins.clear();
        assert!(config.validate().is_err());

        config.cors.allowed_origins = vec!["https://*.*.example.com".to_string()];
        assert!(config.validate().is_err());
    }
}
