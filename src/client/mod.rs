//! HTTP clients for the Petify backend.
//!
//! [`ApiClient`] is the authenticated client: the session is read once per
//! request when it is built, and every response passes through
//! [`AuthFailureHandler`]. Each response decides on its own status, so
//! concurrent 401s each sign out and redirect. [`PublicClient`] shares the
//! transport but has no interceptors.

mod interceptor;
mod transport;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::identity::{RequestContext, SessionProvider};
use crate::navigation::Navigator;

pub use interceptor::{attach_credential, AuthFailureHandler};
pub use transport::{ApiResponse, Transport};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct ApiClient {
    transport: Transport,
    sessions: Arc<dyn SessionProvider>,
    on_failure: AuthFailureHandler,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, sessions: Arc<dyn SessionProvider>, navigator: Arc<dyn Navigator>) -> ClientResult<Self> {
        let transport = Transport::new(config)?;
        let on_failure = AuthFailureHandler::new(sessions.clone(), navigator);
        Ok(Self { transport, sessions, on_failure })
    }

    pub fn sessions(&self) -> &Arc<dyn SessionProvider> { &self.sessions }

    pub fn base(&self) -> &reqwest::Url { self.transport.base() }

    /// Send `method path` to the API origin with the current credential attached.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>, headers: Option<HeaderMap>) -> ClientResult<ApiResponse> {
        let url = self.transport.url_for(path)?;
        let session = self.sessions.current_session();
        let ctx = RequestContext::for_session(&session);
        let mut headers = headers.unwrap_or_default();
        attach_credential(&mut headers, &session);
        if let Ok(v) = HeaderValue::from_str(&ctx.request_id.to_string()) {
            headers.entry(REQUEST_ID_HEADER).or_insert(v);
        }
        let span = info_span!("api_request", request_id = %ctx.request_id, %method, path, state = ?ctx.state);
        async move {
            debug!(target: "http", "sending");
            let result = self.transport.send(method, url, headers, body).await;
            self.on_failure.on_response(result).await
        }
        .instrument(span)
        .await
    }

    /// Like [`ApiClient::request`] with a typed body. A body that cannot be
    /// serialised fails with `ClientError::Encode` before anything is sent.
    pub async fn send_json<T: Serialize + ?Sized>(&self, method: Method, path: &str, body: &T) -> ClientResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.request(method, path, Some(&body), None).await
    }

    pub async fn get(&self, path: &str) -> ClientResult<Value> { Ok(self.request(Method::GET, path, None, None).await?.body) }

    pub async fn post(&self, path: &str, body: &Value) -> ClientResult<Value> {
        Ok(self.request(Method::POST, path, Some(body), None).await?.body)
    }

    pub async fn put(&self, path: &str, body: &Value) -> ClientResult<Value> {
        Ok(self.request(Method::PUT, path, Some(body), None).await?.body)
    }

    pub async fn patch(&self, path: &str, body: Option<&Value>) -> ClientResult<Value> {
        Ok(self.request(Method::PATCH, path, body, None).await?.body)
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Value> { Ok(self.request(Method::DELETE, path, None, None).await?.body) }
}

/// Client for endpoints that need no credential. Failures are returned as-is,
/// without sign-out or redirects.
#[derive(Clone)]
pub struct PublicClient {
    transport: Transport,
}

impl PublicClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> { Ok(Self { transport: Transport::new(config)? }) }

    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>, headers: Option<HeaderMap>) -> ClientResult<ApiResponse> {
        let url = self.transport.url_for(path)?;
        self.transport.send(method, url, headers.unwrap_or_default(), body).await
    }

    pub async fn get(&self, path: &str) -> ClientResult<Value> { Ok(self.request(Method::GET, path, None, None).await?.body) }

    pub async fn post(&self, path: &str, body: &Value) -> ClientResult<Value> {
        Ok(self.request(Method::POST, path, Some(body), None).await?.body)
    }
}
