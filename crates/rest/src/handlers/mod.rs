//! HTTP request handlers.
//!
//! - [`add_claim`] - Claim submission, preflight, and method fallback
//! - [`health`] - Health check endpoints

pub mod add_claim;
pub mod health;

pub use add_claim::{add_claim_handler, method_not_allowed_handler, preflight_handler};
pub use health::{health_handler, liveness_handler};
