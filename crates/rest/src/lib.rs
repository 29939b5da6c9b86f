//! # clinicflow-rest - Claim Ledger HTTP API
//!
//! This crate exposes the ClinicFlow claim ledger over HTTP. A single endpoint
//! accepts a claim and appends it to a per-patient ledger kept as one JSON
//! document in a versioned blob store; see [`clinicflow_ledger`] for the
//! append semantics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clinicflow_ledger::store::MemoryContentsStore;
//! use clinicflow_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::for_testing();
//!     let app = create_app_with_config(Arc::new(MemoryContentsStore::new()), config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | add claim | POST | `/api/add-claim` |
//! | preflight | OPTIONS | `/api/add-claim` |
//! | health | GET | `/health` |
//! | liveness | GET | `/_liveness` |
//!
//! ## Error Handling
//!
//! All errors are returned as `{"error": "<message>"}`:
//!
//! | HTTP Status | Description |
//! |-------------|-------------|
//! | 400 | Missing or invalid request fields |
//! | 405 | Method other than POST/OPTIONS |
//! | 413 | Body larger than the configured limit |
//! | 500 | Missing store credential, unreadable ledger document |
//! | 502 | Store unreachable or answered nonsense |
//! | 503 | Ledger contended for the whole retry budget (`Retry-After` set) |
//! | other | Store error status relayed with the store's body |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and HTTP mapping
//! - [`config`] - Server configuration
//! - [`state`] - Application state (ledger writer, configuration)
//! - [`handlers`] - HTTP request handlers
//! - [`extractors`] - Request body parsing
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{ServerConfig, StoreBackendMode};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use clinicflow_ledger::store::ContentsApi;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<C>(store: Arc<C>) -> Router
where
    C: ContentsApi + ?Sized + 'static,
{
    create_app_with_config(store, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `store` - The contents store client; `Arc<dyn ContentsApi>` works
/// * `config` - Server configuration
pub fn create_app_with_config<C>(store: Arc<C>, config: ServerConfig) -> Router
where
    C: ContentsApi + ?Sized + 'static,
{
    info!(
        "Creating claim ledger API with store backend: {}",
        store.backend_name()
    );

    let state = AppState::new(store, config.clone());
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout),
        ));

    router
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(build_cors_layer(&config))
        .layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level` when set. Call once at startup.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "clinicflow={level},clinicflow_rest={level},clinicflow_ledger={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
