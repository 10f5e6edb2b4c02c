//! HTTP client for the MJS player backend.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, Method};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AdapterError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request to {url} timed out")]
    Timeout { url: String },
    #[error("backend request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, base_url: &str, timeout_ms: u64) -> Self {
        Self { http, base_url: base_url.to_string(), timeout: Duration::from_millis(timeout_ms) }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `method` to `base_url + path`. Any status the backend answers with is returned
    /// as a body; only transport failures are errors.
    pub async fn request(&self, path: &str, method: Method, body: Option<&str>) -> Result<Bytes, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            req = req
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(body.to_string());
        }

        debug!(%method, %url, "backend request");
        let fut = async {
            let resp = req.send().await?;
            resp.bytes().await
        };
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(source)) => {
                warn!(%method, %url, error = %source, "backend transport failure");
                Err(BackendError::Transport { url, source })
            }
            Err(_) => {
                warn!(%method, %url, "backend request timed out");
                Err(BackendError::Timeout { url })
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<Bytes, BackendError> {
        self.request(path, Method::GET, None).await
    }

    /// GETs `path` and parses it; transport failures, empty bodies, malformed JSON and
    /// falsy payloads all become a bad gateway.
    pub async fn fetch_json(&self, path: &str) -> Result<Value, AdapterError> {
        let body = self.get(path).await?;
        parse_json_body(path, &body)
    }

    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Bytes, BackendError> {
        self.request(path, Method::POST, Some(&payload.to_string())).await
    }

    pub async fn delete(&self, path: &str) -> Result<Bytes, BackendError> {
        self.request(path, Method::DELETE, None).await
    }
}

pub fn parse_json_body(path: &str, body: &[u8]) -> Result<Value, AdapterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AdapterError::BadGateway(format!("empty response for {path}")));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v) if is_falsy(&v) => Err(AdapterError::BadGateway(format!("falsy response {v} for {path}"))),
        Ok(v) => Ok(v),
        Err(e) => Err(AdapterError::BadGateway(format!("malformed response for {path}: {e}"))),
    }
}

/// `{}` is a valid (empty) answer; every other empty or zero value is not.
fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(_) => false,
    }
}
