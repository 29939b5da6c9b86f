//! API test harness.

use std::sync::Arc;

use axum_test::TestServer;
use clinicflow_ledger::codec::{self, Ledger};
use clinicflow_ledger::store::{ContentsApi, MemoryContentsStore};
use clinicflow_ledger::types::DocumentLocation;
use clinicflow_rest::{ServerConfig, create_app_with_config};
use serde_json::{Value, json};

pub const OWNER_REPO: &str = "clinic/records";
pub const LEDGER_PATH: &str = "data/claims.json";

/// A test server backed by a [`MemoryContentsStore`] the test can inspect.
pub struct ClaimTestHarness {
    /// The test server instance.
    pub server: TestServer,

    /// The store behind the server.
    pub store: Arc<MemoryContentsStore>,
}

impl ClaimTestHarness {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::for_testing())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryContentsStore::new());
        let app = create_app_with_config(Arc::clone(&store), config);
        let server = TestServer::new(app).expect("Failed to create test server");
        Self { server, store }
    }

    /// Decodes the ledger currently stored at the default location.
    pub fn ledger(&self) -> Ledger {
        codec::decode(self.store.contents(&location()).as_deref()).expect("ledger decodes")
    }
}

/// Builds a test server over any store.
pub fn server_with_store<C>(store: Arc<C>) -> TestServer
where
    C: ContentsApi + ?Sized + 'static,
{
    let app = create_app_with_config(store, ServerConfig::for_testing());
    TestServer::new(app).expect("Failed to create test server")
}

pub fn location() -> DocumentLocation {
    DocumentLocation::parse(OWNER_REPO, LEDGER_PATH).expect("valid location")
}

/// A complete add-claim body.
pub fn submission(claim: Value) -> Value {
    json!({
        "owner_repo": OWNER_REPO,
        "path": LEDGER_PATH,
        "claim": claim
    })
}
