//! The two hooks every authenticated request passes through.
//!
//! Outgoing: put the session's bearer credential on the request.
//! Incoming: on 403 redirect to the forbidden view; on 401 sign out, then
//! redirect to sign-in. The original error is always handed back to the caller.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{info, warn};

use super::transport::ApiResponse;
use crate::error::{ClientError, ClientResult, FailureKind};
use crate::identity::{Session, SessionProvider};
use crate::navigation::{Navigator, Route};

/// Set `Authorization: Bearer <credential>` when the session has a credential.
/// Returns whether the header was set. Anonymous sessions leave `headers` untouched.
pub fn attach_credential(headers: &mut HeaderMap, session: &Session) -> bool {
    let Some(token) = session.credential() else { return false; };
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            true
        }
        Err(_) => {
            warn!(target: "http", "credential is not a valid header value; sending request without it");
            false
        }
    }
}

/// Response side: reacts to 401/403 and passes every result through.
#[derive(Clone)]
pub struct AuthFailureHandler {
    sessions: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
}

impl AuthFailureHandler {
    pub fn new(sessions: Arc<dyn SessionProvider>, navigator: Arc<dyn Navigator>) -> Self { Self { sessions, navigator } }

    pub async fn on_response(&self, result: ClientResult<ApiResponse>) -> ClientResult<ApiResponse> {
        let err = match result {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };
        match err.kind() {
            FailureKind::AuthorizationDenied => {
                warn!(target: "http", "403 forbidden; redirecting to forbidden view");
                self.navigator.redirect_to(Route::Forbidden);
            }
            FailureKind::AuthenticationRequired => {
                warn!(target: "http", "401 unauthorized; signing out");
                if let Err(e) = self.sessions.sign_out().await {
                    warn!(target: "http", error = %e, "sign-out after 401 failed");
                } else {
                    info!(target: "http", "session cleared after 401");
                }
                self.navigator.redirect_to(Route::SignIn);
            }
            FailureKind::TransportOrServer => {}
        }
        Err(err)
    }
}
