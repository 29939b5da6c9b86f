//! ClinicFlow claim ledger server.
//!
//! Serves the add-claim API over a contents store selected by configuration.

use std::sync::Arc;

use clap::Parser;
use clinicflow_ledger::store::{ContentsApi, HttpContentsClient, MemoryContentsStore};
use clinicflow_rest::{ServerConfig, StoreBackendMode, create_app_with_config, init_logging};
use tracing::{info, warn};

/// Builds the contents store client from the server configuration.
fn create_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ContentsApi>> {
    match config.store_backend {
        StoreBackendMode::Http => {
            let store_config = config.http_store_config();
            if store_config.token.is_none() {
                // Startup continues; each submission answers 500 until a token is set.
                warn!(
                    "No store credential configured (CLINICFLOW_STORE_TOKEN or GITHUB_TOKEN); \
                     claim submissions will fail"
                );
            }
            info!(url = %store_config.base_url, "Using HTTP contents store");
            let client = HttpContentsClient::new(store_config)?;
            Ok(Arc::new(client))
        }
        StoreBackendMode::Memory => {
            warn!("Using in-memory contents store; ledgers are lost on exit");
            Ok(Arc::new(MemoryContentsStore::new()))
        }
    }
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %listener.local_addr()?, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        store_backend = %config.store_backend,
        max_attempts = config.max_attempts,
        "Starting ClinicFlow claim ledger server"
    );

    let store = create_store(&config)?;
    let app = create_app_with_config(store, config.clone());
    serve(app, &config).await
}
