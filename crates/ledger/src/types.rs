//! Core value types shared between the store clients and the writer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Address of a ledger document: a repository plus a path inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentLocation {
    owner: String,
    repo: String,
    path: String,
}

impl DocumentLocation {
    /// Parses an `owner/repo` pair and a document path.
    ///
    /// Both halves of `owner_repo` must be non-empty. Leading and trailing
    /// slashes on `path` are ignored; the remaining path must be non-empty.
    pub fn parse(owner_repo: &str, path: &str) -> Result<Self, ValidationError> {
        let mut parts = owner_repo.trim().splitn(2, '/');
        let owner = parts.next().unwrap_or_default().trim();
        let repo = parts.next().unwrap_or_default().trim();
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(ValidationError::InvalidLocation {
                message: "owner_repo must be owner/repo".to_string(),
            });
        }

        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return Err(ValidationError::InvalidLocation {
                message: "path must not be empty".to_string(),
            });
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
        })
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Returns the document path inside the repository.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the non-empty `/`-separated segments of the document path.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.owner, self.repo, self.path)
    }
}

/// Opaque content identity of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wraps a token as returned by the store.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetched document together with the version it was read at.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Raw document bytes, already transport-decoded.
    pub bytes: Vec<u8>,
    /// Version to present on the next conditional write.
    pub version: VersionToken,
}

/// What the store reports about an accepted write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Identifier of the commit that recorded the write.
    pub sha: Option<String>,
    /// Browser URL of that commit.
    pub html_url: Option<String>,
    /// Path of the written document as echoed by the store.
    pub content_path: Option<String>,
}
