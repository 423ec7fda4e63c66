//! Error model shared by the HTTP clients, the session providers and configuration.
//!
//! `ClientError` is what callers of [`crate::client::ApiClient`] observe. The
//! interceptor never converts an error into a success: 401/403 responses still
//! surface here after their side effects have run, carrying the original status
//! and body in an [`HttpFailure`].

use std::fmt::{Display, Formatter};

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A non-2xx response as received from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    pub status: StatusCode,
    pub body: Value,
}

impl HttpFailure {
    pub fn new(status: StatusCode, body: Value) -> Self { Self { status, body } }
}

impl Display for HttpFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            Value::Null => write!(f, "HTTP {}", self.status),
            Value::String(s) if s.is_empty() => write!(f, "HTTP {}", self.status),
            Value::String(s) => write!(f, "HTTP {}: {}", self.status, s),
            other => write!(f, "HTTP {}: {}", self.status, other),
        }
    }
}

/// Coarse classification of a failed request, as seen by the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 403: authenticated but not permitted.
    AuthorizationDenied,
    /// 401: credential missing, expired or invalid.
    AuthenticationRequired,
    /// Any other non-2xx status, or no response at all.
    TransportOrServer,
}

impl FailureKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::FORBIDDEN => FailureKind::AuthorizationDenied,
            StatusCode::UNAUTHORIZED => FailureKind::AuthenticationRequired,
            _ => FailureKind::TransportOrServer,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("forbidden: {0}")]
    AuthorizationDenied(HttpFailure),
    #[error("authentication required: {0}")]
    AuthenticationRequired(HttpFailure),
    #[error("remote error: {0}")]
    Status(HttpFailure),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The path could not be joined onto the base origin; nothing was sent.
    #[error("invalid request path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    /// The request body could not be serialised to JSON; nothing was sent.
    #[error("request body cannot be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    /// Wrap a non-2xx response into the variant matching its status.
    pub fn from_failure(failure: HttpFailure) -> Self {
        match FailureKind::from_status(failure.status) {
            FailureKind::AuthorizationDenied => ClientError::AuthorizationDenied(failure),
            FailureKind::AuthenticationRequired => ClientError::AuthenticationRequired(failure),
            FailureKind::TransportOrServer => ClientError::Status(failure),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::AuthorizationDenied(_) => FailureKind::AuthorizationDenied,
            ClientError::AuthenticationRequired(_) => FailureKind::AuthenticationRequired,
            ClientError::Status(_) | ClientError::Transport(_) | ClientError::InvalidPath { .. } | ClientError::Encode(_) => {
                FailureKind::TransportOrServer
            }
        }
    }

    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            ClientError::AuthorizationDenied(f) | ClientError::AuthenticationRequired(f) | ClientError::Status(f) => Some(f),
            ClientError::Transport(_) | ClientError::InvalidPath { .. } | ClientError::Encode(_) => None,
        }
    }

    /// HTTP status of the response that caused this error, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Transport(e) => e.status(),
            other => other.failure().map(|f| f.status),
        }
    }

    pub fn body(&self) -> Option<&Value> { self.failure().map(|f| &f.body) }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Failures reported by a session provider's sign-in and sign-out operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity service answered but refused the credentials.
    #[error("sign-in rejected ({code}): {message}")]
    Rejected { code: u16, message: String },
    #[error("sign-in method '{0}' is not supported by this provider")]
    UnsupportedMethod(&'static str),
    #[error("identity transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid identity response: {0}")]
    InvalidResponse(String),
    #[error("random source unavailable: {0}")]
    Entropy(String),
}

impl AuthError {
    pub fn rejected<S: Into<String>>(code: u16, message: S) -> Self { AuthError::Rejected { code, message: message.into() } }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
