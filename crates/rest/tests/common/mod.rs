//! Common test utilities for API testing.
//!
//! - [`harness`] - Test server over an in-memory store
//! - [`stores`] - Contents stores that fail in scripted ways

pub mod harness;
pub mod stores;
