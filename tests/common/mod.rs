//! Shared test utilities: loopback mock nodes and node files

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// A downstream node served on a loopback port
#[derive(Clone)]
pub struct MockNode {
    pub url: String,
    calls: Arc<AtomicUsize>,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockNode {
    /// Number of requests the node received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `input` values the node received, in arrival order
    pub async fn inputs(&self) -> Vec<String> {
        self.inputs.lock().await.clone()
    }
}

#[derive(Clone)]
struct MockState {
    delay: Duration,
    body: String,
    calls: Arc<AtomicUsize>,
    inputs: Arc<Mutex<Vec<String>>>,
}

async fn answer(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    state.calls.fetch_add(1, Ordering::SeqCst);
    state
        .inputs
        .lock()
        .await
        .push(params.get("input").cloned().unwrap_or_default());
    tokio::time::sleep(state.delay).await;
    state.body
}

/// Serve `body` verbatim at `/query` after `delay`
pub async fn spawn_node(delay: Duration, body: impl Into<String>) -> MockNode {
    let calls = Arc::new(AtomicUsize::new(0));
    let inputs = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        delay,
        body: body.into(),
        calls: calls.clone(),
        inputs: inputs.clone(),
    };

    let app = Router::new().route("/query", get(answer)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock node");
    let addr = listener.local_addr().expect("mock node has no address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockNode {
        url: format!("http://{addr}/query"),
        calls,
        inputs,
    }
}

/// Serve `{"result": result}` at `/query` after `delay`
pub async fn spawn_result_node(delay: Duration, result: &str) -> MockNode {
    spawn_node(delay, serde_json::json!({ "result": result }).to_string()).await
}

/// A URL nothing listens on
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let port = listener.local_addr().expect("no address").port();
    format!("http://127.0.0.1:{port}/query")
}

/// Write node rows (`url,timeout,type,enabled`) to a temporary CSV file
pub fn node_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create node file");
    for row in rows {
        writeln!(file, "{row}").expect("failed to write node row");
    }
    file
}
