//! Versioned blob store clients.
//!
//! [`ContentsApi`] is the only way the ledger reaches the shared document. An
//! implementation must honour two rules:
//!
//! - `fetch` returns the current bytes together with the version they were
//!   read at, or `None` when nothing exists at the location.
//! - `write` with `expected = None` only succeeds if nothing exists yet; with
//!   `expected = Some(v)` it only succeeds if the current version is still
//!   `v`. A failed precondition is reported as
//!   [`StoreError::VersionConflict`](crate::error::StoreError::VersionConflict).
//!
//! Implementations:
//!
//! - [`HttpContentsClient`] - a contents API reached over HTTP (feature `http`)
//! - [`MemoryContentsStore`] - in-process store for development and tests

#[cfg(feature = "http")]
mod http;
mod memory;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};

#[cfg(feature = "http")]
pub use http::{Committer, HttpContentsClient, HttpStoreConfig};
pub use memory::MemoryContentsStore;

/// Get-by-path and conditional put-by-path over a versioned blob store.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Short name used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Reads the document at `location`.
    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>>;

    /// Writes `content` to `location` if the version precondition holds.
    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo>;
}
