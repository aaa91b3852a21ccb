//! Shared test utilities: in-process mock printers and state files

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::to_bytes,
    extract::{Request, State},
    http::StatusCode,
};
use printfarm_gateway::dispatch::{DispatchConfig, HttpTransport};
use printfarm_gateway::{DeviceRecord, Dispatcher, StateStore};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// One request seen by a mock printer
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    delay: Duration,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// A fake printer control API listening on an ephemeral port
pub struct MockPrinter {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockPrinter {
    /// Start a printer answering every request with 204 immediately
    pub async fn start() -> Self {
        Self::start_with(StatusCode::NO_CONTENT, Duration::ZERO).await
    }

    /// Start a printer with a fixed status and response delay
    pub async fn start_with(status: StatusCode, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            delay,
            requests: requests.clone(),
        };

        let app = Router::new().fallback(record).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    /// Device record pointing at this printer
    pub fn record(&self, id: &str) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            address: self.addr.ip().to_string(),
            port: self.addr.port(),
            api_key: format!("key-{id}"),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(State(state): State<MockState>, req: Request) -> (StatusCode, String) {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let (api_key, content_type) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        (header("x-api-key"), header("content-type"))
    };
    let body = to_bytes(req.into_body(), usize::MAX).await.unwrap().to_vec();

    state.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        api_key,
        content_type,
        body,
    });

    tokio::time::sleep(state.delay).await;
    (state.status, format!("handled {path}"))
}

/// A device record whose port refuses connections
pub async fn unreachable_record(id: &str) -> DeviceRecord {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    DeviceRecord {
        id: id.to_string(),
        address: "127.0.0.1".to_string(),
        port,
        api_key: "unused".to_string(),
    }
}

/// Temporary state and active-flag files
pub struct StateFiles {
    pub dir: TempDir,
}

impl StateFiles {
    /// Write a state snapshot with the given `(id, state text)` pairs
    pub fn new(states: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let files = Self { dir };
        files.write_states(states);
        files
    }

    pub fn write_states(&self, states: &[(&str, &str)]) {
        let printers: serde_json::Map<String, serde_json::Value> = states
            .iter()
            .map(|(id, state)| ((*id).to_string(), serde_json::json!({ "state": state })))
            .collect();
        let snapshot = serde_json::json!({ "printers": printers });
        std::fs::write(self.state_path(), snapshot.to_string()).unwrap();
    }

    pub fn write_active(&self, flags: &[(&str, bool)]) {
        let map: serde_json::Map<String, serde_json::Value> = flags
            .iter()
            .map(|(id, flag)| ((*id).to_string(), serde_json::Value::Bool(*flag)))
            .collect();
        std::fs::write(self.active_path(), serde_json::Value::Object(map).to_string()).unwrap();
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("printer-state.json")
    }

    pub fn active_path(&self) -> PathBuf {
        self.dir.path().join("fake-state.json")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::new(StateStore::new(self.state_path(), self.active_path()))
    }
}

/// Dispatcher over real HTTP with the given timeout
pub fn dispatcher(files: &StateFiles, timeout: Duration) -> Dispatcher {
    Dispatcher::new(
        Arc::new(HttpTransport::new()),
        files.store(),
        DispatchConfig {
            request_timeout: timeout,
            max_concurrency: 8,
        },
    )
}
