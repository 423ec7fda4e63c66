//! Session provider backed by a Firebase-compatible identity toolkit REST API.
//!
//! Every operation is `POST {endpoint}/v1/accounts:<op>?key=<api key>` with a
//! JSON body. Sign-out is local only: the toolkit keeps no server-side session.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::principal::Identity;
use super::provider::{SessionProvider, SignInMethod};
use super::session::{Session, SessionStore};
use crate::config::IdentityConfig;
use crate::error::AuthError;

/// Where provider-delegated sign-ins claim to come back to.
const IDP_REQUEST_URI: &str = "http://localhost";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolkitAuthResponse {
    id_token: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    profile_picture: Option<String>,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolkitErrorEnvelope {
    error: ToolkitErrorBody,
}

#[derive(Debug, Deserialize)]
struct ToolkitErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

pub struct IdentityToolkitProvider {
    http: reqwest::Client,
    config: IdentityConfig,
    store: SessionStore,
}

impl IdentityToolkitProvider {
    pub fn new(config: IdentityConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, config, store: SessionStore::new() })
    }

    pub fn store(&self) -> &SessionStore { &self.store }

    fn op_url(&self, op: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.config.endpoint.as_str().trim_end_matches('/'),
            op,
            urlencoding::encode(&self.config.api_key)
        )
    }

    async fn call(&self, op: &str, body: Value) -> Result<ToolkitAuthResponse, AuthError> {
        debug!(target: "auth", op, "identity toolkit call");
        let resp = self.http.post(self.op_url(op)).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            // Error envelope: {"error": {"code": 400, "message": "INVALID_PASSWORD"}}
            let err = match serde_json::from_str::<ToolkitErrorEnvelope>(&text) {
                Ok(env) => AuthError::rejected(if env.error.code == 0 { status.as_u16() } else { env.error.code }, env.error.message),
                Err(_) => AuthError::rejected(status.as_u16(), text),
            };
            warn!(target: "auth", op, status = status.as_u16(), error = %err, "identity toolkit rejected request");
            return Err(err);
        }
        serde_json::from_str(&text).map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    fn establish(&self, resp: ToolkitAuthResponse, fallback_email: Option<&str>) -> Result<Session, AuthError> {
        let token = resp.id_token.filter(|t| !t.is_empty()).ok_or_else(|| AuthError::InvalidResponse("idToken missing".into()))?;
        let identity = Identity {
            email: resp.email.or_else(|| fallback_email.map(str::to_string)).unwrap_or_default(),
            display_name: resp.display_name.filter(|s| !s.is_empty()),
            photo_url: resp.photo_url.or(resp.profile_picture).filter(|s| !s.is_empty()),
        };
        let mut session = Session::authenticated(token, identity);
        if let Some(secs) = resp.expires_in.as_deref().and_then(|s| s.parse::<i64>().ok()) {
            session.expires_at = Some(Utc::now() + chrono::Duration::seconds(secs));
        }
        self.store.replace(session.clone());
        Ok(session)
    }

    /// Create an account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self.call("signUp", json!({"email": email, "password": password, "returnSecureToken": true})).await?;
        let session = self.establish(resp, Some(email))?;
        info!(target: "auth", email, "auth.sign_up");
        Ok(session)
    }

    /// Set the display name and photo of the signed-in account.
    pub async fn update_profile(&self, display_name: Option<&str>, photo_url: Option<&str>) -> Result<Session, AuthError> {
        let current = self.store.snapshot();
        let Some(token) = current.credential() else { return Err(AuthError::rejected(401, "NOT_SIGNED_IN")); };
        let mut body = json!({"idToken": token, "returnSecureToken": true});
        if let Some(name) = display_name { body["displayName"] = json!(name); }
        if let Some(photo) = photo_url { body["photoUrl"] = json!(photo); }
        let mut resp = self.call("update", body).await?;
        // accounts:update only echoes a new idToken when it rotated one
        if resp.id_token.is_none() {
            resp.id_token = Some(token.to_string());
        }
        if resp.expires_in.is_none() {
            if let Some(exp) = current.expires_at {
                resp.expires_in = Some((exp - Utc::now()).num_seconds().max(0).to_string());
            }
        }
        self.establish(resp, current.email())
    }
}

#[async_trait]
impl SessionProvider for IdentityToolkitProvider {
    fn current_session(&self) -> Session { self.store.snapshot() }

    async fn sign_in(&self, method: SignInMethod) -> Result<Session, AuthError> {
        let session = match &method {
            SignInMethod::Password { email, password } => {
                let resp = self
                    .call("signInWithPassword", json!({"email": email, "password": password, "returnSecureToken": true}))
                    .await?;
                self.establish(resp, Some(email))?
            }
            SignInMethod::Provider { provider_id, id_token } => {
                let post_body = format!("id_token={}&providerId={}", urlencoding::encode(id_token), urlencoding::encode(provider_id));
                let resp = self
                    .call(
                        "signInWithIdp",
                        json!({
                            "postBody": post_body,
                            "requestUri": IDP_REQUEST_URI,
                            "returnSecureToken": true,
                            "returnIdpCredential": true,
                        }),
                    )
                    .await?;
                self.establish(resp, None)?
            }
        };
        info!(target: "auth", method = method.name(), email = session.email().unwrap_or(""), "auth.sign_in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let prev = self.store.clear();
        info!(target: "auth", email = prev.email().unwrap_or("<anonymous>"), "auth.sign_out");
        Ok(())
    }
}
