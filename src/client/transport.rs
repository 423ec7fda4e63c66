use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, HttpFailure};

/// A 2xx response with its body decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body; `Null` when empty, a JSON string when the body was not JSON.
    pub body: Value,
}

/// reqwest client pinned to one backend origin.
#[derive(Clone)]
pub struct Transport {
    base: Url,
    http: reqwest::Client,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = config.timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { base: config.base_url.clone(), http: builder.build()? })
    }

    pub fn base(&self) -> &Url { &self.base }

    /// Prefix `path` with the base origin. Absolute http(s) URLs are accepted only for that same origin.
    pub fn url_for(&self, path: &str) -> ClientResult<Url> {
        if let Some(abs) = Url::parse(path).ok().filter(|u| matches!(u.scheme(), "http" | "https")) {
            if abs.origin() == self.base.origin() {
                return Ok(abs);
            }
            return Err(ClientError::InvalidPath { path: path.to_string(), reason: "resolves outside the API origin".into() });
        }
        let base = self.base.as_str().trim_end_matches('/');
        let joined = if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).map_err(|e| ClientError::InvalidPath { path: path.to_string(), reason: e.to_string() })
    }

    /// Send and decode. Non-2xx statuses come back as the matching `ClientError`.
    pub async fn send(&self, method: Method, url: Url, headers: HeaderMap, body: Option<&Value>) -> ClientResult<ApiResponse> {
        let mut req = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            // A non-2xx status is classified even when its body is cut off.
            Err(e) if !status.is_success() => {
                warn!(target: "http", %method, url = %url, status = status.as_u16(), error = %e, "error body unreadable");
                return Err(ClientError::from_failure(HttpFailure::new(status, Value::Null)));
            }
            Err(e) => return Err(e.into()),
        };
        let body = decode_body(&bytes);
        debug!(target: "http", %method, url = %url, status = status.as_u16(), "response");
        if !status.is_success() {
            return Err(ClientError::from_failure(HttpFailure::new(status, body)));
        }
        Ok(ApiResponse { status, headers, body })
    }
}

pub(crate) fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
