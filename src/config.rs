//! Deployment-time settings read from the environment.
//!
//! Every setting has a `PETIFY_*` variable; only the backend origin is
//! mandatory. Parsing goes through a lookup function so the same code serves
//! `from_env` and tests.

use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;
use crate::navigation::RoutePaths;

pub const ENV_API_URL: &str = "PETIFY_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "PETIFY_HTTP_TIMEOUT_SECS";
pub const ENV_SIGN_IN_ROUTE: &str = "PETIFY_SIGN_IN_ROUTE";
pub const ENV_FORBIDDEN_ROUTE: &str = "PETIFY_FORBIDDEN_ROUTE";
pub const ENV_IDENTITY_API_KEY: &str = "PETIFY_IDENTITY_API_KEY";
pub const ENV_IDENTITY_URL: &str = "PETIFY_IDENTITY_URL";

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin every request path is appended to.
    pub base_url: Url,
    pub timeout: Option<Duration>,
    pub routes: RoutePaths,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self { base_url: parse_http_url(ENV_API_URL, base_url)?, timeout: None, routes: RoutePaths::default() })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_routes(mut self, routes: RoutePaths) -> Self {
        self.routes = routes;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let base = non_empty(&lookup, ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut cfg = Self::new(&base)?;
        if let Some(raw) = non_empty(&lookup, ENV_HTTP_TIMEOUT_SECS) {
            cfg.timeout = Some(parse_secs(ENV_HTTP_TIMEOUT_SECS, &raw)?);
        }
        let defaults = RoutePaths::default();
        cfg.routes = RoutePaths {
            sign_in: non_empty(&lookup, ENV_SIGN_IN_ROUTE).unwrap_or(defaults.sign_in),
            forbidden: non_empty(&lookup, ENV_FORBIDDEN_ROUTE).unwrap_or(defaults.forbidden),
        };
        Ok(cfg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityConfig {
    pub api_key: String,
    pub endpoint: Url,
}

impl IdentityConfig {
    pub fn new(api_key: &str, endpoint: &str) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_IDENTITY_API_KEY));
        }
        Ok(Self { api_key: api_key.trim().to_string(), endpoint: parse_http_url(ENV_IDENTITY_URL, endpoint)? })
    }

    /// `Ok(None)` when no api key is configured: the identity toolkit is simply not in use.
    pub fn from_env() -> Result<Option<Self>, ConfigError> { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Option<Self>, ConfigError> {
        let Some(key) = non_empty(&lookup, ENV_IDENTITY_API_KEY) else { return Ok(None); };
        let endpoint = non_empty(&lookup, ENV_IDENTITY_URL).unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string());
        Self::new(&key, &endpoint).map(Some)
    }
}

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid { name, reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid { name, reason: format!("unsupported scheme '{}'", other) }),
    }
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid { name, reason: "must be greater than zero".into() }),
        Ok(n) => Ok(Duration::from_secs(n)),
        Err(e) => Err(ConfigError::Invalid { name, reason: e.to_string() }),
    }
}
