//! In-process [`ContentsApi`] implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};

use super::ContentsApi;

const BACKEND_NAME: &str = "memory";

#[derive(Debug, Clone)]
struct MemoryObject {
    bytes: Vec<u8>,
    version: VersionToken,
}

/// A contents store held in memory, with the same conditional-write rules as
/// a remote store.
///
/// Versions are minted from a process-wide counter, so a token is never
/// reused even after a document is overwritten.
#[derive(Debug, Default)]
pub struct MemoryContentsStore {
    objects: Mutex<HashMap<DocumentLocation, MemoryObject>>,
    version_counter: AtomicU64,
    commits: AtomicU64,
}

impl MemoryContentsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places raw bytes at `location` without any precondition.
    ///
    /// Returns the version assigned to the bytes.
    pub fn seed(&self, location: &DocumentLocation, bytes: impl Into<Vec<u8>>) -> VersionToken {
        let version = self.next_version();
        self.objects.lock().insert(
            location.clone(),
            MemoryObject {
                bytes: bytes.into(),
                version: version.clone(),
            },
        );
        version
    }

    /// Returns the raw bytes stored at `location`.
    pub fn contents(&self, location: &DocumentLocation) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .get(location)
            .map(|object| object.bytes.clone())
    }

    /// Returns how many conditional writes have been accepted.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    fn next_version(&self) -> VersionToken {
        let n = self.version_counter.fetch_add(1, Ordering::SeqCst) + 1;
        VersionToken::new(format!("{n:040x}"))
    }
}

#[async_trait]
impl ContentsApi for MemoryContentsStore {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        Ok(self
            .objects
            .lock()
            .get(location)
            .map(|object| StoredDocument {
                bytes: object.bytes.clone(),
                version: object.version.clone(),
            }))
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        _message: &str,
    ) -> StoreResult<CommitInfo> {
        let mut objects = self.objects.lock();
        let current = objects.get(location).map(|object| &object.version);

        if current != expected {
            return Err(StoreError::VersionConflict {
                location: location.to_string(),
                expected: expected.map(|v| v.to_string()),
            });
        }

        let version = self.next_version();
        objects.insert(
            location.clone(),
            MemoryObject {
                bytes: content.to_vec(),
                version: version.clone(),
            },
        );
        self.commits.fetch_add(1, Ordering::SeqCst);

        Ok(CommitInfo {
            sha: Some(version.to_string()),
            html_url: None,
            content_path: Some(location.path().to_string()),
        })
    }
}
