//! Error types for the ledger layer.
//!
//! Errors are grouped by how a caller should react to them:
//!
//! - [`ValidationError`] - the submission itself is bad; retrying cannot help
//! - [`StoreError`] - the blob store refused or failed a call
//! - [`LedgerError`] - everything the append path can surface, including
//!   unreadable documents and exhausted retry budgets

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The claim submission failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The stored document could not be read as a ledger.
    #[error("corrupt ledger document at {location}: {message}")]
    CorruptDocument { location: String, message: String },

    /// The blob store rejected or failed a call.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every write attempt within the retry budget lost a version race.
    #[error("gave up on {location} after {attempts} conflicting writes")]
    TooManyConflicts { location: String, attempts: u32 },
}

impl LedgerError {
    /// Returns true if the caller may reasonably retry the whole request later.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::TooManyConflicts { .. } => true,
            LedgerError::Store(e) => e.is_transient(),
            LedgerError::Validation(_) | LedgerError::CorruptDocument { .. } => false,
        }
    }
}

/// Errors related to the claim submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent, null, or blank after trimming.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// A field had a JSON shape that cannot be coerced.
    #[error("invalid value for {field}: {message}")]
    InvalidShape { field: &'static str, message: String },

    /// The document address could not be parsed.
    #[error("invalid document location: {message}")]
    InvalidLocation { message: String },
}

/// Errors reported by a [`ContentsApi`](crate::store::ContentsApi) implementation.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The conditional write was rejected because the document moved.
    #[error("version conflict writing {location}")]
    VersionConflict {
        location: String,
        expected: Option<String>,
    },

    /// The store answered with a failure status, or could not be reached.
    ///
    /// `status` is `None` for transport failures such as timeouts.
    #[error("store unavailable ({}): {body}", describe_status(.status))]
    Unavailable { status: Option<u16>, body: String },

    /// The store rejected the configured credential.
    #[error("store rejected credential ({status}): {body}")]
    Auth { status: u16, body: String },

    /// No credential is configured for the store.
    #[error("missing store credential")]
    MissingCredential,

    /// The store answered with a success status but an unreadable body.
    #[error("malformed store response: {message}")]
    MalformedResponse { message: String },

    /// The client is misconfigured.
    #[error("invalid store configuration: {message}")]
    Config { message: String },
}

impl StoreError {
    /// Returns true for failures that may clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::VersionConflict { .. } => true,
            StoreError::Unavailable { status, .. } => status.is_none_or(|s| s >= 500 || s == 429),
            StoreError::Auth { .. }
            | StoreError::MissingCredential
            | StoreError::MalformedResponse { .. }
            | StoreError::Config { .. } => false,
        }
    }

    /// Returns the upstream HTTP status, if the store sent one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            StoreError::Unavailable { status, .. } => *status,
            StoreError::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "no response".to_string(),
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;
