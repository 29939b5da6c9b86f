//! Application state shared by all request handlers.

use std::sync::Arc;

use clinicflow_ledger::store::ContentsApi;
use clinicflow_ledger::writer::LedgerWriter;

use crate::config::ServerConfig;

/// Shared application state for the API.
///
/// # Type Parameters
///
/// * `C` - The contents store client (may be `dyn ContentsApi`)
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use clinicflow_ledger::store::MemoryContentsStore;
/// use clinicflow_rest::{AppState, ServerConfig};
///
/// let state = AppState::new(Arc::new(MemoryContentsStore::new()), ServerConfig::for_testing());
/// assert_eq!(state.backend_name(), "memory");
/// ```
pub struct AppState<C: ContentsApi + ?Sized> {
    writer: LedgerWriter<C>,
    config: Arc<ServerConfig>,
}

// Manual impl: C sits behind an Arc and need not be Clone.
impl<C: ContentsApi + ?Sized> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: ContentsApi + ?Sized> AppState<C> {
    /// Creates a new AppState, deriving the retry policy from `config`.
    pub fn new(store: Arc<C>, config: ServerConfig) -> Self {
        let writer = LedgerWriter::new(store, config.append_policy());
        Self {
            writer,
            config: Arc::new(config),
        }
    }

    /// Returns the ledger writer.
    pub fn writer(&self) -> &LedgerWriter<C> {
        &self.writer
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the name of the contents store backend.
    pub fn backend_name(&self) -> &'static str {
        self.writer.client().backend_name()
    }
}
