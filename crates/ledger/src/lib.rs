//! ClinicFlow Claim Ledger
//!
//! This crate appends dental billing claims to a per-patient ledger that lives
//! as a single JSON document inside a versioned blob store. The store is reached
//! through a "contents" API offering get-by-path and put-by-path, where every
//! put is gated on the version token returned by the previous get.
//!
//! # Architecture
//!
//! - [`claim`] - Validation and canonicalization of raw claim submissions
//! - [`codec`] - The [`Ledger`] document and its JSON byte representation
//! - [`store`] - The [`ContentsApi`] seam plus HTTP and in-memory clients
//! - [`writer`] - The optimistic read-modify-write append loop
//! - [`error`] - Error taxonomy shared by all of the above
//!
//! # Concurrency
//!
//! The ledger document is the only shared mutable resource. Writers never hold
//! locks across network calls; instead [`LedgerWriter::append_claim`] fetches
//! the document, applies the append locally, and writes back conditioned on the
//! fetched version token. A rejected write means another writer got there
//! first, so the loop re-reads and reapplies the same entry until it commits or
//! the attempt budget runs out.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clinicflow_ledger::claim::{ClaimValue, RawClaim};
//! use clinicflow_ledger::store::MemoryContentsStore;
//! use clinicflow_ledger::types::DocumentLocation;
//! use clinicflow_ledger::writer::{AppendPolicy, LedgerWriter};
//!
//! # async fn run() -> clinicflow_ledger::error::LedgerResult<()> {
//! let store = Arc::new(MemoryContentsStore::new());
//! let writer = LedgerWriter::new(store, AppendPolicy::default());
//!
//! let location = DocumentLocation::parse("clinic/records", "claims.json")?;
//! let claim = RawClaim {
//!     patient: Some(ClaimValue::from("Jane Citizen")),
//!     date: Some(ClaimValue::from("2024-01-01")),
//!     code: Some(ClaimValue::from("11")),
//!     ..Default::default()
//! };
//!
//! let outcome = writer.append_claim(&location, claim).await?;
//! println!("committed after {} attempt(s)", outcome.attempts());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod claim;
pub mod codec;
pub mod error;
pub mod store;
pub mod types;
pub mod writer;

pub use claim::{ClaimEntry, NormalizedClaim, RawClaim};
pub use codec::{Ledger, StoredEntry};
pub use error::{LedgerError, LedgerResult, StoreError, ValidationError};
pub use store::ContentsApi;
pub use types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};
pub use writer::{AppendOutcome, AppendPolicy, LedgerWriter};
