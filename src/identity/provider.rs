use std::fmt;

use async_trait::async_trait;

use super::session::Session;
use crate::error::AuthError;

/// How a user proves who they are to the identity provider.
#[derive(Clone)]
pub enum SignInMethod {
    Password { email: String, password: String },
    /// Delegated sign-in: an id token minted by an external provider such as `google.com`.
    Provider { provider_id: String, id_token: String },
}

impl SignInMethod {
    pub fn password<S: Into<String>>(email: S, password: S) -> Self {
        SignInMethod::Password { email: email.into(), password: password.into() }
    }

    pub fn provider<S: Into<String>>(provider_id: S, id_token: S) -> Self {
        SignInMethod::Provider { provider_id: provider_id.into(), id_token: id_token.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignInMethod::Password { .. } => "password",
            SignInMethod::Provider { .. } => "provider",
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for SignInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignInMethod::Password { email, .. } => {
                f.debug_struct("Password").field("email", email).field("password", &"<redacted>").finish()
            }
            SignInMethod::Provider { provider_id, .. } => {
                f.debug_struct("Provider").field("provider_id", provider_id).field("id_token", &"<redacted>").finish()
            }
        }
    }
}

/// Source of truth for the current credential.
///
/// The HTTP client calls `current_session` once per outgoing request and
/// `sign_out` when the backend answers 401.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Snapshot of the session as it is right now.
    fn current_session(&self) -> Session;

    async fn sign_in(&self, method: SignInMethod) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
