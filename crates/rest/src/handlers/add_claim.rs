//! Add-claim endpoint handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clinicflow_ledger::store::ContentsApi;
use clinicflow_ledger::writer::AppendOutcome;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{RestError, RestResult};
use crate::extractors::ClaimSubmission;
use crate::state::AppState;

/// Success body of the add-claim endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddClaimResponse {
    /// Always `true`.
    pub ok: bool,
    /// Commit that recorded the claim; `null` when it was already present.
    pub commit_sha: Option<String>,
    /// Browsable URL of the commit, if the store reports one.
    pub commit_url: Option<String>,
    /// Path of the ledger document as reported by the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
    /// Set when a retry found the claim already written.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_applied: bool,
}

impl From<AppendOutcome> for AddClaimResponse {
    fn from(outcome: AppendOutcome) -> Self {
        match outcome {
            AppendOutcome::Committed { commit, .. } => Self {
                ok: true,
                commit_sha: commit.sha,
                commit_url: commit.html_url,
                content_path: commit.content_path,
                already_applied: false,
            },
            AppendOutcome::AlreadyApplied { .. } => Self {
                ok: true,
                commit_sha: None,
                commit_url: None,
                content_path: None,
                already_applied: true,
            },
        }
    }
}

/// Handler for claim submission.
///
/// # HTTP Request
///
/// `POST [base]/api/add-claim`
///
/// Body: `{"owner_repo": "owner/repo", "path": "...", "claim": {...}}`
///
/// # Response
///
/// - `200 OK` - `{"ok": true, "commit_sha", "commit_url", "content_path"}`
/// - `400 Bad Request` - Missing or invalid fields
/// - `500 Internal Server Error` - Missing credential or unreadable ledger
/// - `503 Service Unavailable` - Ledger stayed contended; retry later
/// - Store error statuses are passed through with the store's body
pub async fn add_claim_handler<C>(
    State(state): State<AppState<C>>,
    ClaimSubmission(request): ClaimSubmission,
) -> RestResult<Response>
where
    C: ContentsApi + ?Sized + 'static,
{
    debug!(
        location = %request.location,
        backend = state.backend_name(),
        "Processing add-claim request"
    );

    let outcome = state
        .writer()
        .append_claim(&request.location, request.claim)
        .await
        .map_err(|e| {
            let err = RestError::from(e);
            if err.status().is_server_error() {
                error!(location = %request.location, status = err.status().as_u16(), error = %err, "Claim append failed");
            } else {
                warn!(location = %request.location, status = err.status().as_u16(), error = %err, "Claim rejected");
            }
            err
        })?;

    Ok((StatusCode::OK, Json(AddClaimResponse::from(outcome))).into_response())
}

/// Handler for `OPTIONS` on the add-claim endpoint.
///
/// CORS preflights are answered by the CORS layer; this covers bare
/// `OPTIONS` requests.
pub async fn preflight_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Fallback for any other method on the add-claim endpoint.
pub async fn method_not_allowed_handler() -> RestError {
    RestError::MethodNotAllowed
}
