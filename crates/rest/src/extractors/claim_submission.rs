//! Claim submission extractor.
//!
//! Parses the add-claim request body into an [`AddClaimRequest`] before the
//! handler runs, so handlers never see an unvalidated document address.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, rejection::BytesRejection},
    response::{IntoResponse, Response},
};
use clinicflow_ledger::claim::RawClaim;
use clinicflow_ledger::error::{LedgerError, ValidationError};
use clinicflow_ledger::types::DocumentLocation;
use serde_json::{Map, Value};

use crate::error::RestError;

/// A parsed add-claim request.
///
/// Wire form: `{"owner_repo": "owner/repo", "path": "...", "claim": {...}}`.
/// Unknown top-level fields are ignored.
#[derive(Debug, Clone)]
pub struct AddClaimRequest {
    /// Where the ledger document lives.
    pub location: DocumentLocation,
    /// The claim as submitted, not yet normalized.
    pub claim: RawClaim,
}

impl AddClaimRequest {
    /// Builds a request from a decoded JSON body.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut body) = value else {
            return Err(ValidationError::InvalidShape {
                field: "body",
                message: "expected a JSON object".to_string(),
            });
        };

        let owner_repo = take_string(&mut body, "owner_repo")?;
        let path = take_string(&mut body, "path")?;
        let claim = match body.remove("claim") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField { field: "claim" }),
            Some(value) => RawClaim::try_from(value)?,
        };

        Ok(Self {
            location: DocumentLocation::parse(&owner_repo, &path)?,
            claim,
        })
    }
}

fn take_string(body: &mut Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match body.remove(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::MissingField { field }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::InvalidShape {
            field,
            message: "expected a string".to_string(),
        }),
    }
}

/// Axum extractor for add-claim requests.
///
/// The body is read as JSON whatever the declared content type; an empty body
/// is treated as `{}`.
///
/// # Example
///
/// ```rust,ignore
/// use clinicflow_rest::extractors::ClaimSubmission;
///
/// async fn handler(ClaimSubmission(request): ClaimSubmission) {
///     println!("appending to {}", request.location);
/// }
/// ```
#[derive(Debug)]
pub struct ClaimSubmission(pub AddClaimRequest);

/// Error type for claim submission extraction failures.
#[derive(Debug)]
pub enum ClaimSubmissionRejection {
    /// The body could not be read (too large, aborted).
    Body(BytesRejection),
    /// The body is not JSON.
    InvalidJson(serde_json::Error),
    /// The body is JSON but not a valid submission.
    Invalid(ValidationError),
}

impl From<ClaimSubmissionRejection> for RestError {
    fn from(rejection: ClaimSubmissionRejection) -> Self {
        match rejection {
            ClaimSubmissionRejection::Body(e) => e.into(),
            ClaimSubmissionRejection::InvalidJson(e) => e.into(),
            ClaimSubmissionRejection::Invalid(e) => LedgerError::from(e).into(),
        }
    }
}

impl IntoResponse for ClaimSubmissionRejection {
    fn into_response(self) -> Response {
        RestError::from(self).into_response()
    }
}

impl<S> FromRequest<S> for ClaimSubmission
where
    S: Send + Sync,
{
    type Rejection = ClaimSubmissionRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(ClaimSubmissionRejection::Body)?;

        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(&bytes).map_err(ClaimSubmissionRejection::InvalidJson)?
        };

        AddClaimRequest::from_value(value)
            .map(ClaimSubmission)
            .map_err(ClaimSubmissionRejection::Invalid)
    }
}
