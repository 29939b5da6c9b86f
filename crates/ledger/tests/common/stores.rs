//! Scripted [`ContentsApi`] wrappers.
//!
//! Each wrapper delegates to a [`MemoryContentsStore`] and injects one kind
//! of misbehaviour, so the append loop can be driven through races and
//! failures deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use clinicflow_ledger::error::{StoreError, StoreResult};
use clinicflow_ledger::store::{ContentsApi, MemoryContentsStore};
use clinicflow_ledger::types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};
use tokio::sync::Barrier;

/// Holds the first `parties` fetches until all of them have read, so every
/// party starts from the same version.
pub struct BarrierStore {
    pub inner: Arc<MemoryContentsStore>,
    barrier: Barrier,
    parties: usize,
    fetches: AtomicUsize,
}

impl BarrierStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: Arc::new(MemoryContentsStore::new()),
            barrier: Barrier::new(parties),
            parties,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentsApi for BarrierStore {
    fn backend_name(&self) -> &'static str {
        "barrier"
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let doc = self.inner.fetch(location).await?;
        if n < self.parties {
            self.barrier.wait().await;
        }
        Ok(doc)
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo> {
        self.inner.write(location, content, expected, message).await
    }
}

/// Rejects the first `conflicts` writes with a version conflict without
/// touching the document.
pub struct ConflictingStore {
    pub inner: Arc<MemoryContentsStore>,
    remaining: AtomicU32,
    writes: AtomicU32,
}

impl ConflictingStore {
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: Arc::new(MemoryContentsStore::new()),
            remaining: AtomicU32::new(conflicts),
            writes: AtomicU32::new(0),
        }
    }

    pub fn always() -> Self {
        Self::new(u32::MAX)
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentsApi for ConflictingStore {
    fn backend_name(&self) -> &'static str {
        "conflicting"
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        self.inner.fetch(location).await
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::VersionConflict {
                location: location.to_string(),
                expected: expected.map(|v| v.to_string()),
            });
        }
        self.inner.write(location, content, expected, message).await
    }
}

/// Applies the first write but reports it as a conflict, as if the
/// acknowledgement was lost in transit.
pub struct LostAckStore {
    pub inner: Arc<MemoryContentsStore>,
    writes: AtomicU32,
}

impl LostAckStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryContentsStore::new()),
            writes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ContentsApi for LostAckStore {
    fn backend_name(&self) -> &'static str {
        "lost-ack"
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        self.inner.fetch(location).await
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo> {
        let commit = self.inner.write(location, content, expected, message).await?;
        if self.writes.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::VersionConflict {
                location: location.to_string(),
                expected: expected.map(|v| v.to_string()),
            });
        }
        Ok(commit)
    }
}

/// Which call a [`FailingStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Fetch,
    Write,
}

/// Fails every fetch or every write with a fixed error.
pub struct FailingStore {
    pub inner: Arc<MemoryContentsStore>,
    error: StoreError,
    fail_on: FailOn,
    fetches: AtomicU32,
    writes: AtomicU32,
}

impl FailingStore {
    pub fn new(fail_on: FailOn, error: StoreError) -> Self {
        Self {
            inner: Arc::new(MemoryContentsStore::new()),
            error,
            fail_on,
            fetches: AtomicU32::new(0),
            writes: AtomicU32::new(0),
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentsApi for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == FailOn::Fetch {
            return Err(self.error.clone());
        }
        self.inner.fetch(location).await
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == FailOn::Write {
            return Err(self.error.clone());
        }
        self.inner.write(location, content, expected, message).await
    }
}
