//! Contents API client over HTTP.
//!
//! Wire contract:
//!
//! - `GET {base}/repos/{owner}/{repo}/contents/{path}` returns
//!   `{"sha": ..., "content": <base64>}` or `404`.
//! - `PUT` on the same URL accepts
//!   `{"message", "content": <base64>, "committer": {"name", "email"}, "sha"?}`
//!   and returns `{"commit": {"sha", "html_url"}, "content": {"path"}}`.
//!
//! Sending `sha` makes the put conditional on that version; omitting it makes
//! the put create-only. Failure bodies are kept verbatim for diagnostics.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::{CommitInfo, DocumentLocation, StoredDocument, VersionToken};

use super::ContentsApi;

const BACKEND_NAME: &str = "http";
const ACCEPT_CONTENTS: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Identity recorded as the committer of each write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Default for Committer {
    fn default() -> Self {
        Self {
            name: "ClinicFlow Bot".to_string(),
            email: "clinicflow-bot@users.noreply.github.com".to_string(),
        }
    }
}

/// HTTP contents client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStoreConfig {
    /// API root, e.g. `https://api.github.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential. Calls fail with `MissingCredential` when absent.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Committer identity sent with writes.
    #[serde(default)]
    pub committer: Committer,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_ms: default_timeout_ms(),
            committer: Committer::default(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    concat!("clinicflow-ledger/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    committer: &'a Committer,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct PutContentsResponse {
    #[serde(default)]
    commit: Option<CommitField>,
    #[serde(default)]
    content: Option<ContentField>,
}

#[derive(Debug, Deserialize)]
struct CommitField {
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentField {
    #[serde(default)]
    path: Option<String>,
}

/// [`ContentsApi`] backed by a remote contents API.
#[derive(Debug, Clone)]
pub struct HttpContentsClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    committer: Committer,
}

impl HttpContentsClient {
    /// Builds a client from configuration.
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| StoreError::Config {
            message: format!("invalid base URL '{}': {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config {
                message: format!("base URL '{}' cannot carry a path", config.base_url),
            });
        }

        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            token: config.token.filter(|t| !t.trim().is_empty()),
            committer: config.committer,
        })
    }

    /// Builds the contents URL for `location`, percent-encoding each segment.
    pub fn contents_url(&self, location: &DocumentLocation) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| StoreError::Config {
                message: "base URL cannot carry a path".to_string(),
            })?;
            segments
                .pop_if_empty()
                .extend(["repos", location.owner(), location.repo(), "contents"])
                .extend(location.path_segments());
        }
        Ok(url)
    }

    fn token(&self) -> StoreResult<&str> {
        self.token.as_deref().ok_or(StoreError::MissingCredential)
    }
}

#[async_trait]
impl ContentsApi for HttpContentsClient {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn fetch(&self, location: &DocumentLocation) -> StoreResult<Option<StoredDocument>> {
        let token = self.token()?;
        let url = self.contents_url(location)?;
        debug!(url = %url, "Fetching ledger document");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(header::ACCEPT, ACCEPT_CONTENTS)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_failure_status(status, body));
        }

        let body: ContentsResponse =
            response
                .json()
                .await
                .map_err(|e| StoreError::MalformedResponse {
                    message: format!("unreadable contents response: {e}"),
                })?;

        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(StoreError::MalformedResponse {
                    message: format!("unsupported content encoding '{encoding}'"),
                });
            }
        }

        // Base64 payloads arrive wrapped at 60 columns.
        let compact: String = body.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| StoreError::MalformedResponse {
                message: format!("content is not valid base64: {e}"),
            })?;

        Ok(Some(StoredDocument {
            bytes,
            version: VersionToken::new(body.sha),
        }))
    }

    async fn write(
        &self,
        location: &DocumentLocation,
        content: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> StoreResult<CommitInfo> {
        let token = self.token()?;
        let url = self.contents_url(location)?;
        debug!(url = %url, conditional = expected.is_some(), "Writing ledger document");

        let request = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            committer: &self.committer,
            sha: expected.map(VersionToken::as_str),
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .header(header::ACCEPT, ACCEPT_CONTENTS)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_write_failure(status, body, location, expected));
        }

        let body: PutContentsResponse =
            response
                .json()
                .await
                .map_err(|e| StoreError::MalformedResponse {
                    message: format!("unreadable write response: {e}"),
                })?;

        let (sha, html_url) = body
            .commit
            .map(|commit| (commit.sha, commit.html_url))
            .unwrap_or_default();

        Ok(CommitInfo {
            sha,
            html_url,
            content_path: body.content.and_then(|c| c.path),
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    let body = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    StoreError::Unavailable { status: None, body }
}

fn map_failure_status(status: StatusCode, body: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth {
            status: status.as_u16(),
            body,
        },
        _ => StoreError::Unavailable {
            status: Some(status.as_u16()),
            body,
        },
    }
}

// A create-only put that loses the race is answered with 422 "sha wasn't
// supplied" rather than 409.
fn map_write_failure(
    status: StatusCode,
    body: String,
    location: &DocumentLocation,
    expected: Option<&VersionToken>,
) -> StoreError {
    let conflict = match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => true,
        StatusCode::UNPROCESSABLE_ENTITY => expected.is_none() && body.contains("sha"),
        _ => false,
    };

    if conflict {
        StoreError::VersionConflict {
            location: location.to_string(),
            expected: expected.map(|v| v.to_string()),
        }
    } else {
        map_failure_status(status, body)
    }
}
