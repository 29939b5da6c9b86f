//! Contents stores that fail in scripted ways.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use clinicflow_ledger::error::{StoreError, StoreResult};
use clinicflow_ledger::store::ContentsApi;
use clinicflow_ledger::types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};

/// Reads an empty ledger and fails every write with a fixed error.
pub struct RejectingStore {
    error: StoreError,
    writes: AtomicU32,
}

impl RejectingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            writes: AtomicU32::new(0),
        }
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentsApi for RejectingStore {
    fn backend_name(&self) -> &'static str {
        "rejecting"
    }

    async fn fetch(&self, _location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        Ok(None)
    }

    async fn write(
        &self,
        _location: &DocumentLocation,
        _content: &[u8],
        _expected: Option<&VersionToken>,
        _message: &str,
    ) -> StoreResult<CommitInfo> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
