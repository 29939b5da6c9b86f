//! Common test utilities for the ledger crate.
//!
//! - [`fixtures`] - Claim and location builders
//! - [`stores`] - [`ContentsApi`](clinicflow_ledger::ContentsApi) wrappers that
//!   script conflicts and failures around an in-memory store
//! - [`fake_api`] - An HTTP contents API served on a loopback port

pub mod fake_api;
pub mod fixtures;
pub mod stores;
