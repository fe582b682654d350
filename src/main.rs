//! User Records Server
//!
//! Serves CRUD over a single collection of user records kept in a JSON file.

use anyhow::Context;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use user_records::api::start_server;
use user_records::core::config::StorageType;
use user_records::records::RecordService;
use user_records::storage::create_store;
use user_records::{Config, Error, Result};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("user-records")
        .version(user_records::VERSION)
        .about("CRUD API over a JSON-file-backed collection of user records.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address")
        )
        .arg(
            Arg::new("data-file")
                .long("data-file")
                .value_name("FILE")
                .help("JSON document holding the collection")
        )
        .arg(
            Arg::new("storage-type")
                .long("storage-type")
                .value_name("TYPE")
                .help("Storage backend type (file, memory)")
        )
        .arg(
            Arg::new("ordering")
                .long("ordering")
                .value_name("POLICY")
                .help("Where new records go (newest-first, oldest-first)")
        )
        .arg(
            Arg::new("bulk-flush")
                .long("bulk-flush")
                .value_name("MODE")
                .help("When bulk-create persists (every-item, once-at-end)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging
    user_records::init_logging(&config.logging)?;

    // Initialize storage
    let store = create_store(&config.storage).context("initializing storage")?;
    info!("Storage initialized: {:?}", config.storage.backend);
    if config.storage.backend == StorageType::Memory {
        info!("Records will not survive a restart");
    }

    let service = Arc::new(RecordService::from_config(store, &config.records));
    info!(
        "Record policies: ordering={:?}, bulk_flush={:?}",
        config.records.ordering, config.records.bulk_flush
    );

    start_server(service, &config).await?;
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(data_file) = matches.get_one::<String>("data-file") {
        config.storage.data_file = PathBuf::from(data_file);
    }

    if let Some(storage_type) = matches.get_one::<String>("storage-type") {
        config.storage.backend = storage_type.parse()?;
    }

    if let Some(ordering) = matches.get_one::<String>("ordering") {
        config.records.ordering = ordering.parse()?;
    }

    if let Some(flush) = matches.get_one::<String>("bulk-flush") {
        config.records.bulk_flush = flush.parse()?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}
