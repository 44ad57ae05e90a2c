//! Test helpers: an in-process stand-in for the Swarmia Export API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use swarmia_mcp_server::{Config, Credential, SwarmiaClient};

pub const TEST_TOKEN: &str = "test-token";
pub const CSV_BODY: &str = "col1,col2\nval1,val2";

/// A request seen by the fake API: path plus decoded query.
pub type Seen = (String, HashMap<String, String>);

#[derive(Clone, Default)]
pub struct FakeApi {
    seen: Arc<Mutex<Vec<Seen>>>,
    delay: Arc<Mutex<Duration>>,
}

impl FakeApi {
    /// Hold every later response for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.requests().pop().expect("fake API saw no request")
    }
}

/// Routes:
/// - wrong or missing token → 401 `invalid token`
/// - `/reports/dora` → 500 `internal error`
/// - anything else under `/reports/` → 200 with [`CSV_BODY`]
async fn report(
    State(api): State<FakeApi>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let path = uri.path().trim_start_matches("/api/v0").to_string();
    api.seen.lock().unwrap().push((path.clone(), query.clone()));

    let delay = *api.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if query.get("token").map(String::as_str) != Some(TEST_TOKEN) {
        return (StatusCode::UNAUTHORIZED, "invalid token".to_string());
    }
    if path == "/reports/dora" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string());
    }
    (StatusCode::OK, CSV_BODY.to_string())
}

/// Start the fake API on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_api() -> (String, FakeApi) {
    let api = FakeApi::default();
    let app = Router::new()
        .route("/api/v0/reports/{*rest}", get(report))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/v0", addr), api)
}

pub fn client_for(base_url: &str, token: &str) -> SwarmiaClient {
    let config = Config::new(base_url, Credential::new(token).unwrap()).unwrap();
    SwarmiaClient::new(config).unwrap()
}

pub fn client_with_timeout(base_url: &str, token: &str, timeout: Duration) -> SwarmiaClient {
    let config = Config::new(base_url, Credential::new(token).unwrap()).unwrap();
    SwarmiaClient::with_timeout(config, timeout).unwrap()
}

/// A one-shot server that answers 500 and closes the connection halfway
/// through the announced body.
pub async fn spawn_truncating_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/api/v0", addr)
}

/// A base URL nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v0", addr)
}
