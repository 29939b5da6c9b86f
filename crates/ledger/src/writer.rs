//! Optimistic append of a claim to the shared ledger document.
//!
//! Each attempt is one read-modify-write cycle:
//!
//! 1. Fetch the document and its version token (absent means empty).
//! 2. Decode, append the entry, re-sort that patient's entries, encode.
//! 3. Write back conditioned on the fetched token (or create-only).
//!
//! A [`StoreError::VersionConflict`] restarts the cycle with a fresh read,
//! reapplying the same normalized entry. Any other failure ends the append.
//! No lock is held across store calls.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::claim::{NormalizedClaim, RawClaim};
use crate::codec::{self, CodecError, StoredEntry};
use crate::error::{LedgerError, LedgerResult, StoreError};
use crate::store::ContentsApi;
use crate::types::{CommitInfo, DocumentLocation, VersionToken};

/// Retry budget for the append loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendPolicy {
    /// Total read-modify-write cycles allowed per append, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay after a conflict. The n-th conflict waits `n * backoff_ms`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    50
}

impl Default for AppendPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl AppendPolicy {
    /// Checks that the policy allows at least one attempt.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// How an append finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry was written by this append.
    Committed {
        /// Commit details reported by the store.
        commit: CommitInfo,
        /// Cycles used, including the successful one.
        attempts: u32,
    },

    /// A retry found the exact entry already present.
    ///
    /// This happens when a write landed but its acknowledgement was lost and
    /// reported as a conflict.
    AlreadyApplied {
        /// Version of the document that already holds the entry.
        version: Option<VersionToken>,
        /// Cycles used.
        attempts: u32,
    },
}

impl AppendOutcome {
    /// Commit details, if this append performed the write.
    pub fn commit(&self) -> Option<&CommitInfo> {
        match self {
            AppendOutcome::Committed { commit, .. } => Some(commit),
            AppendOutcome::AlreadyApplied { .. } => None,
        }
    }

    /// Number of read-modify-write cycles used.
    pub fn attempts(&self) -> u32 {
        match self {
            AppendOutcome::Committed { attempts, .. }
            | AppendOutcome::AlreadyApplied { attempts, .. } => *attempts,
        }
    }

    /// Returns true if the entry was found already written.
    pub fn is_already_applied(&self) -> bool {
        matches!(self, AppendOutcome::AlreadyApplied { .. })
    }
}

/// Appends claims to ledger documents through a [`ContentsApi`].
pub struct LedgerWriter<C: ContentsApi + ?Sized> {
    client: Arc<C>,
    policy: AppendPolicy,
}

impl<C: ContentsApi + ?Sized> Clone for LedgerWriter<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            policy: self.policy,
        }
    }
}

impl<C: ContentsApi + ?Sized> LedgerWriter<C> {
    /// Creates a writer over `client`.
    pub fn new(client: Arc<C>, policy: AppendPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the store client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &AppendPolicy {
        &self.policy
    }

    /// Validates `claim` and appends it to the ledger at `location`.
    ///
    /// Validation failures are returned before the store is contacted.
    pub async fn append_claim(
        &self,
        location: &DocumentLocation,
        claim: RawClaim,
    ) -> LedgerResult<AppendOutcome> {
        let claim = claim.normalize()?;
        self.append_normalized(location, &claim).await
    }

    /// Appends an already-normalized claim, retrying on version conflicts.
    ///
    /// The same entry (including its `entered_at`) is reapplied on every
    /// attempt, so a retried append is detected by exact match.
    pub async fn append_normalized(
        &self,
        location: &DocumentLocation,
        claim: &NormalizedClaim,
    ) -> LedgerResult<AppendOutcome> {
        let message = claim.commit_message();
        let entry =
            StoredEntry::from_claim(&claim.entry).map_err(|e| corrupt_document(location, e))?;
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let current = self.client.fetch(location).await?;
            let (bytes, version) = match current {
                Some(doc) => (Some(doc.bytes), Some(doc.version)),
                None => (None, None),
            };

            let mut ledger =
                codec::decode(bytes.as_deref()).map_err(|e| corrupt_document(location, e))?;

            if attempt > 1 && ledger.contains(&claim.patient, &entry) {
                info!(
                    location = %location,
                    patient = %claim.patient,
                    attempt,
                    "Claim already present after conflict"
                );
                return Ok(AppendOutcome::AlreadyApplied {
                    version,
                    attempts: attempt,
                });
            }

            ledger.append(&claim.patient, entry.clone());
            let content = codec::encode(&ledger).map_err(|e| corrupt_document(location, e))?;

            debug!(
                location = %location,
                backend = self.client.backend_name(),
                attempt,
                create = version.is_none(),
                "Writing ledger"
            );

            match self
                .client
                .write(location, &content, version.as_ref(), &message)
                .await
            {
                Ok(commit) => {
                    info!(
                        location = %location,
                        patient = %claim.patient,
                        sha = commit.sha.as_deref().unwrap_or("-"),
                        attempt,
                        "Claim committed"
                    );
                    return Ok(AppendOutcome::Committed {
                        commit,
                        attempts: attempt,
                    });
                }
                Err(StoreError::VersionConflict { .. }) => {
                    warn!(
                        location = %location,
                        attempt,
                        max_attempts,
                        "Ledger changed underneath append, retrying"
                    );
                    if attempt < max_attempts {
                        let delay = self.policy.backoff_after(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LedgerError::TooManyConflicts {
            location: location.to_string(),
            attempts: max_attempts,
        })
    }
}

fn corrupt_document(location: &DocumentLocation, err: CodecError) -> LedgerError {
    LedgerError::CorruptDocument {
        location: location.to_string(),
        message: err.to_string(),
    }
}
