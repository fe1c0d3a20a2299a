#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use nodego_pinger::{ClientSettings, ReportEvent, Reporter};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct PingHit {
    pub token: String,
    pub at: Instant,
    pub body: Value,
}

#[derive(Default)]
pub struct MockState {
    pub failing_tokens: HashSet<String>,
    pub pings: Mutex<Vec<PingHit>>,
    pub profile_hits: Mutex<Vec<String>>,
    pub counter: AtomicU64,
}

impl MockState {
    pub fn pings(&self) -> Vec<PingHit> {
        self.pings.lock().unwrap().clone()
    }
}

/// In-process stand-in for the rewards API.
pub struct MockApi {
    pub base_url: String,
    pub ip_url: String,
    pub state: Arc<MockState>,
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

async fn profile(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let token = bearer(&headers);
    state.profile_hits.lock().unwrap().push(token.clone());

    if state.failing_tokens.contains(&token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"statusCode": 401, "message": "Unauthorized"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "statusCode": 200,
            "message": "ok",
            "metadata": {
                "username": format!("user-{}", token),
                "email": format!("{}@example.com", token),
                "rewardPoint": 1520.5,
                "nodes": [
                    {"id": "node-1", "totalPoint": 1000, "todayPoint": 12.5, "isActive": true},
                    {"id": "node-2", "totalPoint": 520.5, "todayPoint": 0, "isActive": false}
                ]
            }
        })),
    )
}

async fn ping(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let token = bearer(&headers);
    state.pings.lock().unwrap().push(PingHit {
        token: token.clone(),
        at: Instant::now(),
        body: body.clone(),
    });

    if state.failing_tokens.contains(&token) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"statusCode": 500, "message": "Internal error"})),
        );
    }
    if body.get("type").and_then(Value::as_str) != Some("extension") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"statusCode": 400, "message": "bad type"})),
        );
    }

    let n = state.counter.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::CREATED,
        Json(json!({
            "statusCode": 201,
            "message": "Ping successful",
            "metadata": {"id": format!("ping-{}-{}", token, n)}
        })),
    )
}

async fn ip() -> Json<Value> {
    Json(json!({"origin": "127.0.0.1"}))
}

impl MockApi {
    pub async fn start(failing_tokens: &[&str]) -> Self {
        let state = Arc::new(MockState {
            failing_tokens: failing_tokens.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/user/me", get(profile))
            .route("/api/user/nodes/ping", post(ping))
            .route("/ip", get(ip))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            ip_url: format!("http://{}/ip", addr),
            state,
        }
    }

    pub fn client_settings(&self, ping_interval: Duration) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            ip_check_url: self.ip_url.clone(),
            timeout: Duration::from_secs(5),
            ping_interval,
            randomize_user_agent: true,
        }
    }
}

/// Port that refuses connections: bound, then released.
pub async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Server that accepts connections and never answers, holding requests in flight.
pub async fn silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    port
}

/// Minimal HTTP forward proxy that answers every request itself with `body`
/// and records the request line it saw.
pub async fn canned_http_proxy(body: &'static str) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let seen = seen_clone.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                if let Some(line) = request.lines().next() {
                    seen.lock().unwrap().push(line.to_string());
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    (port, seen)
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &ReportEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
