//! HTTP server implementation for the user records API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::{cors::cors_layer, handlers};
use crate::core::{Config, Error, Result};
use crate::records::RecordService;
use crate::storage::RecordStore;

/// Creates the main application router with all routes and middleware
pub fn create_app<S: RecordStore>(service: Arc<RecordService<S>>, config: &Config) -> Router {
    let base = config.records.base_path.as_str();

    Router::new()
        // Collection routes
        .route(
            base,
            get(handlers::list_records::<S>).post(handlers::create_record::<S>),
        )
        .route(
            &format!("{}/bulk-delete", base),
            post(handlers::bulk_delete_records::<S>),
        )
        .route(
            &format!("{}/bulk-create", base),
            post(handlers::bulk_create_records::<S>),
        )
        .route(
            &format!("{}/:id", base),
            get(handlers::get_record::<S>)
                .put(handlers::update_record::<S>)
                .delete(handlers::delete_record::<S>),
        )

        // System routes
        .route("/health", get(handlers::health_check::<S>))

        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors)),
        )
        .with_state(service)
}

/// Start the HTTP server and run until Ctrl+C or SIGTERM
pub async fn start_server<S: RecordStore>(service: Arc<RecordService<S>>, config: &Config) -> Result<()> {
    let addr = config.server.http_addr;
    tracing::info!("Starting user records API server on {}", addr);

    let app = create_app(service, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Cannot bind {}: {}", addr, e)))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Collection available at http://{}{}", addr, config.records.base_path);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::warn!("Received terminate signal");
        },
    }
}
