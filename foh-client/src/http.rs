//! HTTP client with a shared default authorization slot
//!
//! The session layer installs and clears the bearer token here, so every
//! caller holding the same client picks the change up immediately.

use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Error body returned by the backend on rejected requests.
#[derive(serde::Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client trait
///
/// Object-safe: verbs move `serde_json::Value`, typed decoding lives in
/// [`crate::api`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, path: &str) -> ClientResult<Value>;
    async fn post(&self, path: &str, body: Option<Value>) -> ClientResult<Value>;
    async fn put(&self, path: &str, body: Option<Value>) -> ClientResult<Value>;
    async fn delete(&self, path: &str) -> ClientResult<Value>;

    /// Install or clear the default bearer token.
    fn set_bearer(&self, token: Option<String>);
    fn bearer(&self) -> Option<String>;
}

/// Network HTTP client
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    bearer: Arc<RwLock<Option<String>>>,
}

impl NetworkHttpClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_header(&self) -> Option<String> {
        self.bearer
            .read()
            .ok()
            .and_then(|t| t.as_ref().map(|t| format!("Bearer {t}")))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn handle_response(&self, path: &str, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            // 401/403 on an /api route is an auth error the session layer
            // reacts to; outside /api it is an ordinary rejection.
            let api_route = path.trim_start_matches('/').starts_with("api");
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if api_route => {
                    Err(ClientError::Auth(message))
                }
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(message)),
                _ => Err(ClientError::Server(message)),
            };
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("{path}: {e}")))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Value> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(auth) = self.auth_header() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        self.handle_response(path, response).await
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(reqwest::Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn put(&self, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.send(reqwest::Method::PUT, path, body).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(reqwest::Method::DELETE, path, None).await
    }

    fn set_bearer(&self, token: Option<String>) {
        if let Ok(mut slot) = self.bearer.write() {
            *slot = token;
        }
    }

    fn bearer(&self) -> Option<String> {
        self.bearer.read().ok().and_then(|t| t.clone())
    }
}
