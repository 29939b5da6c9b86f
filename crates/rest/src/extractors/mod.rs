//! Axum extractors for claim ledger requests.
//!
//! - [`ClaimSubmission`] - Parse and validate an add-claim body

mod claim_submission;

pub use claim_submission::{AddClaimRequest, ClaimSubmission, ClaimSubmissionRejection};
