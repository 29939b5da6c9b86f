//! Health check endpoint handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clinicflow_ledger::store::ContentsApi;
use tracing::debug;

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Reports the process as up and names the configured store. The store itself
/// is not contacted.
///
/// # HTTP Request
///
/// `GET [base]/health`
pub async fn health_handler<C>(State(state): State<AppState<C>>) -> Response
where
    C: ContentsApi + ?Sized + 'static,
{
    debug!("Processing health check request");

    let health_response = serde_json::json!({
        "status": "healthy",
        "store": state.backend_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(health_response)).into_response()
}

/// Handler for the liveness probe.
///
/// # HTTP Request
///
/// `GET [base]/_liveness`
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}
