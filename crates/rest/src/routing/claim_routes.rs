//! Claim ledger route configuration.

use axum::{
    Router,
    routing::{get, post},
};
use clinicflow_ledger::store::ContentsApi;

use crate::handlers;
use crate::state::AppState;

/// Path of the claim submission endpoint.
pub const ADD_CLAIM_PATH: &str = "/api/add-claim";

/// Creates all API routes.
///
/// # Routes
///
/// - `POST /api/add-claim` - Append a claim to a ledger
/// - `OPTIONS /api/add-claim` - Preflight, always `200`
/// - any other method on `/api/add-claim` - `405`
/// - `GET /health` - Health check
/// - `GET /_liveness` - Liveness probe
pub fn create_routes<C>(state: AppState<C>) -> Router
where
    C: ContentsApi + ?Sized + 'static,
{
    Router::new()
        .route(
            ADD_CLAIM_PATH,
            post(handlers::add_claim_handler::<C>)
                .options(handlers::preflight_handler)
                .fallback(handlers::method_not_allowed_handler),
        )
        .route("/health", get(handlers::health_handler::<C>))
        .route("/_liveness", get(handlers::liveness_handler))
        .with_state(state)
}
