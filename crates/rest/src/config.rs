//! Server configuration for the claim ledger API.
//!
//! Every option can be given on the command line or through an environment
//! variable.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CLINICFLOW_PORT` | 8080 | Server port |
//! | `CLINICFLOW_HOST` | 127.0.0.1 | Host to bind |
//! | `CLINICFLOW_LOG_LEVEL` | info | Log level |
//! | `CLINICFLOW_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `CLINICFLOW_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `CLINICFLOW_CORS_ORIGINS` | * | Allowed origins |
//! | `CLINICFLOW_CORS_METHODS` | POST,OPTIONS | Allowed methods |
//! | `CLINICFLOW_CORS_HEADERS` | Content-Type,Authorization | Allowed headers |
//! | `CLINICFLOW_STORE_BACKEND` | http | `http` or `memory` |
//! | `CLINICFLOW_STORE_URL` | https://api.github.com | Contents API base URL |
//! | `CLINICFLOW_STORE_TOKEN` | none | Store credential (falls back to `GITHUB_TOKEN`) |
//! | `CLINICFLOW_STORE_TIMEOUT_MS` | 10000 | Per-call store timeout |
//! | `CLINICFLOW_MAX_ATTEMPTS` | 5 | Append attempts before giving up |
//! | `CLINICFLOW_RETRY_BACKOFF_MS` | 50 | Base delay between conflicting attempts |
//! | `CLINICFLOW_COMMITTER_NAME` | ClinicFlow Bot | Commit author name |
//! | `CLINICFLOW_COMMITTER_EMAIL` | clinicflow-bot@users.noreply.github.com | Commit author email |
//!
//! # Example
//!
//! ```rust
//! use clinicflow_rest::{ServerConfig, StoreBackendMode};
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     store_backend: StoreBackendMode::Memory,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;

use clap::{Parser, ValueEnum};
use clinicflow_ledger::writer::AppendPolicy;

#[cfg(feature = "http")]
use clinicflow_ledger::store::{Committer, HttpStoreConfig};

/// Which contents store the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackendMode {
    /// Remote contents API over HTTP.
    #[default]
    Http,
    /// Process-local store. Data is lost on restart.
    Memory,
}

impl fmt::Display for StoreBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackendMode::Http => write!(f, "http"),
            StoreBackendMode::Memory => write!(f, "memory"),
        }
    }
}

/// Server configuration for the claim ledger API.
#[derive(Debug, Clone, Parser)]
#[command(name = "clinicflow")]
#[command(about = "ClinicFlow claim ledger server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "CLINICFLOW_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "CLINICFLOW_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "CLINICFLOW_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "CLINICFLOW_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "CLINICFLOW_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "CLINICFLOW_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "CLINICFLOW_CORS_METHODS", default_value = "POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "CLINICFLOW_CORS_HEADERS",
        default_value = "Content-Type,Authorization"
    )]
    pub cors_headers: String,

    /// Contents store backend.
    #[arg(long, env = "CLINICFLOW_STORE_BACKEND", value_enum, default_value_t = StoreBackendMode::Http)]
    pub store_backend: StoreBackendMode,

    /// Contents API base URL.
    #[arg(long, env = "CLINICFLOW_STORE_URL", default_value = "https://api.github.com")]
    pub store_url: String,

    /// Bearer credential for the contents API.
    #[arg(long, env = "CLINICFLOW_STORE_TOKEN", hide_env_values = true)]
    pub store_token: Option<String>,

    /// Per-call store timeout in milliseconds.
    #[arg(long, env = "CLINICFLOW_STORE_TIMEOUT_MS", default_value = "10000")]
    pub store_timeout_ms: u64,

    /// Read-modify-write attempts per claim before reporting contention.
    #[arg(long, env = "CLINICFLOW_MAX_ATTEMPTS", default_value = "5")]
    pub max_attempts: u32,

    /// Base delay in milliseconds between conflicting attempts.
    #[arg(long, env = "CLINICFLOW_RETRY_BACKOFF_MS", default_value = "50")]
    pub retry_backoff_ms: u64,

    /// Name recorded as committer of each ledger write.
    #[arg(long, env = "CLINICFLOW_COMMITTER_NAME", default_value = "ClinicFlow Bot")]
    pub committer_name: String,

    /// Email recorded as committer of each ledger write.
    #[arg(
        long,
        env = "CLINICFLOW_COMMITTER_EMAIL",
        default_value = "clinicflow-bot@users.noreply.github.com"
    )]
    pub committer_email: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            cors_origins: "*".to_string(),
            cors_methods: "POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization".to_string(),
            store_backend: StoreBackendMode::Http,
            store_url: "https://api.github.com".to_string(),
            store_token: None,
            store_timeout_ms: 10_000,
            max_attempts: 5,
            retry_backoff_ms: 50,
            committer_name: "ClinicFlow Bot".to_string(),
            committer_email: "clinicflow-bot@users.noreply.github.com".to_string(),
        }
    }
}

fn first_non_blank(
    primary: Option<String>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    let non_blank = |token: &String| !token.trim().is_empty();
    primary.filter(non_blank).or_else(|| fallback().filter(non_blank))
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the store credential, falling back to `GITHUB_TOKEN`.
    ///
    /// Blank values count as absent.
    pub fn resolved_store_token(&self) -> Option<String> {
        first_non_blank(self.store_token.clone(), || std::env::var("GITHUB_TOKEN").ok())
    }

    /// Returns the retry policy for ledger appends.
    pub fn append_policy(&self) -> AppendPolicy {
        AppendPolicy {
            max_attempts: self.max_attempts,
            backoff_ms: self.retry_backoff_ms,
        }
    }

    /// Returns the HTTP store client configuration.
    #[cfg(feature = "http")]
    pub fn http_store_config(&self) -> HttpStoreConfig {
        HttpStoreConfig {
            base_url: self.store_url.clone(),
            token: self.resolved_store_token(),
            timeout_ms: self.store_timeout_ms,
            committer: Committer {
                name: self.committer_name.clone(),
                email: self.committer_email.clone(),
            },
            ..Default::default()
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if let Err(e) = self.append_policy().validate() {
            errors.push(format!("Invalid retry policy: {e}"));
        }

        if self.store_backend == StoreBackendMode::Http {
            if self.store_timeout_ms == 0 {
                errors.push("Store timeout cannot be 0".to_string());
            }
            if !self.store_url.starts_with("http://") && !self.store_url.starts_with("https://") {
                errors.push(format!(
                    "Store URL must start with http:// or https://, got '{}'",
                    self.store_url
                ));
            }
        }

        if self.committer_name.trim().is_empty() || self.committer_email.trim().is_empty() {
            errors.push("Committer name and email cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses the in-memory store, an ephemeral port, and no retry backoff.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            store_backend: StoreBackendMode::Memory,
            store_token: Some("test-token".to_string()),
            store_timeout_ms: 2_000,
            retry_backoff_ms: 0,
            ..Default::default()
        }
    }
}
