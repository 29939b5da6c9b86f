//! A contents API double served over real HTTP on `127.0.0.1:0`.
//!
//! Follows the wire contract of the HTTP client: base64 payloads wrapped at
//! 60 columns, `sha` preconditions, and `422` for a create that collides with
//! an existing file.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedPut {
    pub message: String,
    pub content: String,
    pub committer: Value,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Default)]
struct FakeState {
    files: HashMap<String, (Vec<u8>, u64)>,
    next_version: u64,
    puts: Vec<RecordedPut>,
    paths: Vec<String>,
    fail_next: Option<(StatusCode, String)>,
}

/// Handle to a running fake contents API.
#[derive(Clone)]
pub struct FakeContentsApi {
    pub addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeContentsApi {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents),
            )
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake contents API");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake contents API");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Places a file directly, returning its sha.
    pub fn seed(&self, owner: &str, repo: &str, path: &str, bytes: &[u8]) -> String {
        let mut state = self.state.lock();
        state.next_version += 1;
        let version = state.next_version;
        state
            .files
            .insert(file_key(owner, repo, path), (bytes.to_vec(), version));
        sha(version)
    }

    pub fn file(&self, owner: &str, repo: &str, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .files
            .get(&file_key(owner, repo, path))
            .map(|(bytes, _)| bytes.clone())
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.state.lock().puts.clone()
    }

    /// Decoded request paths seen so far.
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().paths.clone()
    }

    /// Makes the next request fail with `status` and `body`.
    pub fn fail_next(&self, status: StatusCode, body: &str) {
        self.state.lock().fail_next = Some((status, body.to_string()));
    }
}

fn file_key(owner: &str, repo: &str, path: &str) -> String {
    format!("{owner}/{repo}/{path}")
}

fn sha(version: u64) -> String {
    format!("{version:040x}")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "message": message }))).into_response()
}

fn preflight(state: &mut FakeState, headers: &HeaderMap, path: &str) -> Option<Response> {
    state.paths.push(path.to_string());
    if let Some((status, body)) = state.fail_next.take() {
        return Some((status, body).into_response());
    }
    let expected = format!("Bearer {TOKEN}");
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Some(error(StatusCode::UNAUTHORIZED, "Bad credentials"));
    }
    None
}

async fn get_contents(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock();
    if let Some(response) = preflight(&mut state, &headers, &path) {
        return response;
    }

    let Some((bytes, version)) = state.files.get(&file_key(&owner, &repo, &path)) else {
        return error(StatusCode::NOT_FOUND, "Not Found");
    };

    let encoded = STANDARD.encode(bytes);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    axum::Json(json!({
        "type": "file",
        "path": path,
        "sha": sha(*version),
        "encoding": "base64",
        "content": format!("{wrapped}\n"),
    }))
    .into_response()
}

async fn put_contents(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<RecordedPut>,
) -> Response {
    let mut state = state.lock();
    if let Some(response) = preflight(&mut state, &headers, &path) {
        return response;
    }
    state.puts.push(body.clone());

    let key = file_key(&owner, &repo, &path);
    let current = state.files.get(&key).map(|(_, v)| sha(*v));
    match (&current, &body.sha) {
        (Some(_), None) => {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied.",
            );
        }
        (Some(current), Some(given)) if current != given => {
            return error(StatusCode::CONFLICT, "is at a different sha");
        }
        (None, Some(_)) => return error(StatusCode::CONFLICT, "file no longer exists"),
        _ => {}
    }

    let Ok(bytes) = STANDARD.decode(&body.content) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "content is not valid Base64");
    };

    state.next_version += 1;
    let version = state.next_version;
    state.files.insert(key, (bytes, version));

    let status = if current.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let commit_sha = format!("c{version:039x}");
    (
        status,
        axum::Json(json!({
            "content": { "path": path, "sha": sha(version) },
            "commit": {
                "sha": commit_sha,
                "html_url": format!("https://example.test/{owner}/{repo}/commit/{commit_sha}"),
            }
        })),
    )
        .into_response()
}
