//! Error types for the claim ledger API.
//!
//! Every failure is answered with a JSON body of the form
//! `{"error": "<message>"}`.
//!
//! # Error Mapping
//!
//! | Ledger Error | HTTP Status |
//! |--------------|-------------|
//! | Validation | 400 |
//! | CorruptDocument | 500 |
//! | TooManyConflicts | 503 + `Retry-After` |
//! | Store `Unavailable` with upstream status | upstream status, upstream body |
//! | Store `Unavailable` without status (timeout, transport) | 502 |
//! | Store `Auth` | upstream status, upstream body |
//! | Store `MissingCredential` / `Config` | 500 |
//! | Store `MalformedResponse` | 502 |

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use clinicflow_ledger::error::{LedgerError, StoreError};
use std::fmt;

/// Seconds a client is told to wait after the ledger stayed contended.
pub const RETRY_AFTER_SECS: u64 = 1;

/// The primary error type for API operations.
#[derive(Debug)]
pub enum RestError {
    /// Malformed or incomplete request (HTTP 400).
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// Request body exceeds the configured limit (HTTP 413).
    PayloadTooLarge {
        /// Description of the problem.
        message: String,
    },

    /// Method not supported on the endpoint (HTTP 405).
    MethodNotAllowed,

    /// The blob store answered with an error status; relayed as-is.
    Upstream {
        /// Status returned by the store.
        status: StatusCode,
        /// Body returned by the store.
        body: String,
    },

    /// The blob store could not be reached or answered nonsense (HTTP 502).
    BadGateway {
        /// Description of the problem.
        message: String,
    },

    /// The ledger stayed contended for the whole retry budget (HTTP 503).
    Contended {
        /// Description of the problem.
        message: String,
    },

    /// Server-side failure (HTTP 500).
    InternalError {
        /// Description of the problem.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RestError::Upstream { status, .. } => *status,
            RestError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            RestError::Contended { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "{}", message),
            RestError::PayloadTooLarge { message } => write!(f, "{}", message),
            RestError::MethodNotAllowed => write!(f, "Method not allowed"),
            RestError::Upstream { status, body } => {
                if body.trim().is_empty() {
                    write!(
                        f,
                        "Store request failed with status {}",
                        status.as_u16()
                    )
                } else {
                    write!(f, "{}", body)
                }
            }
            RestError::BadGateway { message } => write!(f, "{}", message),
            RestError::Contended { message } => write!(f, "{}", message),
            RestError::InternalError { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));

        let mut response = (status, body).into_response();
        if matches!(self, RestError::Contended { .. }) {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(RETRY_AFTER_SECS),
            );
        }
        response
    }
}

impl From<LedgerError> for RestError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(e) => RestError::BadRequest {
                message: e.to_string(),
            },
            LedgerError::CorruptDocument { .. } => RestError::InternalError {
                message: err.to_string(),
            },
            LedgerError::TooManyConflicts { .. } => RestError::Contended {
                message: err.to_string(),
            },
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable {
                status: Some(status),
                body,
            }
            | StoreError::Auth { status, body } => match StatusCode::from_u16(status) {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    RestError::Upstream { status, body }
                }
                _ => RestError::BadGateway {
                    message: format!("Store answered with unexpected status {status}: {body}"),
                },
            },
            StoreError::Unavailable { status: None, .. } | StoreError::MalformedResponse { .. } => {
                RestError::BadGateway {
                    message: err.to_string(),
                }
            }
            StoreError::VersionConflict { .. } => RestError::Contended {
                message: err.to_string(),
            },
            StoreError::MissingCredential => RestError::InternalError {
                message: "Missing store credential (set CLINICFLOW_STORE_TOKEN or GITHUB_TOKEN)"
                    .to_string(),
            },
            StoreError::Config { .. } => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

impl From<BytesRejection> for RestError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RestError::PayloadTooLarge {
                message: rejection.body_text(),
            }
        } else {
            RestError::BadRequest {
                message: rejection.body_text(),
            }
        }
    }
}

/// Result type for API operations.
pub type RestResult<T> = Result<T, RestError>;
