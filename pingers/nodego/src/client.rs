//! NodeGo API client for a single account.
//!
//! Wraps the account's bearer token and transport, and exposes the two calls
//! the pinger needs: `GET /user/me` and `POST /user/nodes/ping`. Pings from the
//! same client are spaced by at least `ping_interval` (3s by default).

use crate::transport::Transport;
use core_logic::{AccountCredential, ApiError, NetworkError, PingPacer, RequestError};
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const PROFILE_ENDPOINT: &str = "/user/me";
pub const PING_ENDPOINT: &str = "/user/nodes/ping";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Longest error body kept in an [`ApiError::HttpStatus`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API root without trailing slash, e.g. `https://nodego.ai/api`.
    pub base_url: String,
    pub ip_check_url: String,
    pub timeout: Duration,
    pub ping_interval: Duration,
    pub randomize_user_agent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingResult {
    pub status_code: i64,
    pub message: String,
    pub metadata_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub id: String,
    pub total_point: f64,
    pub today_point: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub total_point: f64,
    pub nodes: Vec<NodeInfo>,
}

// --- Wire types ---

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "statusCode")]
    status_code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    metadata: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileMetadata {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    reward_point: f64,
    #[serde(default)]
    nodes: Vec<NodeMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeMetadata {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    total_point: f64,
    #[serde(default)]
    today_point: f64,
    #[serde(default)]
    is_active: bool,
}

#[derive(Deserialize)]
struct PingMetadata {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

#[derive(Deserialize)]
struct IpEcho {
    origin: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

pub struct ApiClient {
    credential: AccountCredential,
    transport: Transport,
    settings: ClientSettings,
    pacer: PingPacer,
}

impl ApiClient {
    pub fn new(credential: AccountCredential, transport: Transport, settings: ClientSettings) -> Self {
        let pacer = PingPacer::new(settings.ping_interval);
        Self {
            credential,
            transport,
            settings,
            pacer,
        }
    }

    pub fn label(&self) -> String {
        self.credential.label()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub async fn fetch_profile(&self) -> Result<UserProfile, RequestError> {
        let (_, envelope): (u16, Envelope<ProfileMetadata>) =
            self.call(Method::GET, PROFILE_ENDPOINT, None).await?;

        let metadata = envelope
            .metadata
            .ok_or_else(|| {
                self.invalid(&self.endpoint_url(PROFILE_ENDPOINT), "missing metadata")
            })?;

        Ok(UserProfile {
            username: metadata.username.unwrap_or_default(),
            email: metadata.email.unwrap_or_default(),
            total_point: metadata.reward_point,
            nodes: metadata
                .nodes
                .into_iter()
                .map(|n| NodeInfo {
                    id: n.id,
                    total_point: n.total_point,
                    today_point: n.today_point,
                    is_active: n.is_active,
                })
                .collect(),
        })
    }

    /// Sends one keep-alive ping, waiting first if the previous one was too recent.
    pub async fn ping(&mut self) -> Result<PingResult, RequestError> {
        self.pacer.wait_turn().await;

        let outcome: Result<(u16, Envelope<PingMetadata>), RequestError> = self
            .call(Method::POST, PING_ENDPOINT, Some(json!({ "type": "extension" })))
            .await;
        self.pacer.mark();

        let (http_status, envelope) = outcome?;
        let metadata = envelope
            .metadata
            .ok_or_else(|| {
                self.invalid(&self.endpoint_url(PING_ENDPOINT), "missing metadata.id")
            })?;

        Ok(PingResult {
            status_code: envelope.status_code.unwrap_or(i64::from(http_status)),
            message: envelope.message.unwrap_or_default(),
            metadata_id: metadata.id,
        })
    }

    /// Public IP seen by the outside world through this client's transport.
    /// No credentials are sent.
    pub async fn fetch_exit_ip(&self) -> Result<String, RequestError> {
        let endpoint = self.settings.ip_check_url.clone();
        let url = Url::parse(&endpoint).map_err(|e| NetworkError::Request {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        let request = self.request(Method::GET, &url);
        let (_, echo): (u16, IpEcho) = self.execute(request, &endpoint).await?;
        Ok(echo.origin)
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(u16, T), RequestError> {
        let full = self.endpoint_url(path);
        let url = Url::parse(&full).map_err(|e| NetworkError::Request {
            endpoint: full.clone(),
            reason: e.to_string(),
        })?;

        let mut request = self
            .request(method, &url)
            .bearer_auth(self.credential.token());
        if let Some(body) = body {
            request = request.json(&body);
        }

        self.execute(request, &full).await
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let client = self.transport.client_for(url);
        let mut request = client.request(method, url.clone());
        if self.settings.randomize_user_agent {
            if let Some(agent) = USER_AGENTS.choose(&mut rand::thread_rng()) {
                request = request.header(USER_AGENT, *agent);
            }
        }
        request
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<(u16, T), RequestError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e, endpoint))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify(e, endpoint))?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status_code: status.as_u16(),
                endpoint: endpoint.to_string(),
                body: clip(&text, MAX_ERROR_BODY),
            }
            .into());
        }

        let parsed = serde_json::from_str(&text)
            .map_err(|e| self.invalid(endpoint, &e.to_string()))?;
        debug!("{} {} -> {}", self.label(), endpoint, status);
        Ok((status.as_u16(), parsed))
    }

    fn classify(&self, err: reqwest::Error, endpoint: &str) -> RequestError {
        let endpoint = endpoint.to_string();
        let reason = error_chain(&err);
        let network = if err.is_timeout() {
            NetworkError::Timeout {
                timeout_ms: self.settings.timeout.as_millis() as u64,
                endpoint,
            }
        } else if err.is_connect() {
            NetworkError::ConnectionFailed { endpoint, reason }
        } else if err.is_decode() {
            return self.invalid(&endpoint, &reason);
        } else {
            NetworkError::Request { endpoint, reason }
        };
        network.into()
    }

    fn invalid(&self, endpoint: &str, reason: &str) -> RequestError {
        ApiError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit - 3).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
