//! Route configuration for the claim ledger API.

pub mod claim_routes;

pub use claim_routes::{ADD_CLAIM_PATH, create_routes};
