use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::info;

use super::principal::Identity;
use super::provider::{SessionProvider, SignInMethod};
use crate::error::AuthError;

/// Client-held record of the current identity and credential.
///
/// A `Session` is plain data: providers hand out snapshots of it and the HTTP
/// client reads one per request. An empty credential string counts as absent.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
    /// Expiry reported by the identity provider. The client never acts on it;
    /// the backend decides with a 401.
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl Session {
    pub fn anonymous() -> Self { Self::default() }

    pub fn authenticated<S: Into<String>>(credential: S, identity: Identity) -> Self {
        Self { credential: Some(credential.into()), identity: Some(identity), expires_at: None }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The bearer credential, if one is present and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|c| !c.is_empty())
    }

    pub fn state(&self) -> SessionState {
        if self.credential().is_some() { SessionState::Authenticated } else { SessionState::Anonymous }
    }

    pub fn email(&self) -> Option<&str> { self.identity.as_ref().map(|i| i.email.as_str()) }
}

/// Shared slot holding the current session. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> Session { self.inner.read().clone() }

    pub fn replace(&self, session: Session) -> Session { std::mem::replace(&mut *self.inner.write(), session) }

    /// Drop the session, returning whatever was there.
    pub fn clear(&self) -> Session { self.replace(Session::anonymous()) }
}

pub(crate) fn gen_token() -> Result<String, AuthError> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// In-process session provider.
///
/// Holds registered email/password accounts and issues random opaque tokens on
/// sign-in. Provider-delegated sign-in is not available here.
pub struct MemorySessionProvider {
    store: SessionStore,
    accounts: RwLock<HashMap<String, Account>>,
    pub ttl: Option<Duration>,
}

impl Default for MemorySessionProvider {
    fn default() -> Self { Self { store: SessionStore::new(), accounts: RwLock::new(HashMap::new()), ttl: None } }
}

impl MemorySessionProvider {
    pub fn new() -> Self { Self::default() }

    /// Start out with an already established session (e.g. a token handed in from outside).
    pub fn with_session(session: Session) -> Self {
        let p = Self::default();
        p.store.replace(session);
        p
    }

    pub fn store(&self) -> &SessionStore { &self.store }

    pub fn register(&self, identity: Identity, password: &str) {
        let key = identity.email.to_lowercase();
        self.accounts.write().insert(key, Account { password: password.to_string(), identity });
    }

    pub fn set_session(&self, session: Session) { self.store.replace(session); }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    fn current_session(&self) -> Session { self.store.snapshot() }

    async fn sign_in(&self, method: SignInMethod) -> Result<Session, AuthError> {
        let SignInMethod::Password { email, password } = method else {
            return Err(AuthError::UnsupportedMethod("provider"));
        };
        let account = self.accounts.read().get(&email.to_lowercase()).cloned();
        let Some(account) = account else { return Err(AuthError::rejected(400, "EMAIL_NOT_FOUND")); };
        if account.password != password {
            return Err(AuthError::rejected(400, "INVALID_PASSWORD"));
        }
        let mut session = Session::authenticated(gen_token()?, account.identity);
        if let Some(ttl) = self.ttl.and_then(|t| chrono::Duration::from_std(t).ok()) {
            session.expires_at = Some(Utc::now() + ttl);
        }
        self.store.replace(session.clone());
        info!(target: "auth", email = %email, "auth.sign_in method=password");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let prev = self.store.clear();
        info!(target: "auth", email = prev.email().unwrap_or("<anonymous>"), "auth.sign_out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_credential() {
        assert_eq!(Session::anonymous().state(), SessionState::Anonymous);
        let s = Session::authenticated("abc123", Identity::new("x@y.com"));
        assert_eq!(s.state(), SessionState::Authenticated);
        assert_eq!(s.credential(), Some("abc123"));
        let empty = Session { credential: Some(String::new()), ..Default::default() };
        assert_eq!(empty.state(), SessionState::Anonymous);
        assert_eq!(empty.credential(), None);
    }

    #[test]
    fn debug_redacts_credential() {
        let s = Session::authenticated("abc123", Identity::new("x@y.com"));
        let out = format!("{:?}", s);
        assert!(!out.contains("abc123"));
        assert!(out.contains("<redacted>"));
        assert!(out.contains("x@y.com"));
        assert!(format!("{:?}", Session::anonymous()).contains("credential: None"));
    }

    #[test]
    fn store_clones_share_the_slot() {
        let a = SessionStore::new();
        let b = a.clone();
        a.replace(Session::authenticated("t", Identity::new("x@y.com")));
        assert_eq!(b.snapshot().credential(), Some("t"));
        let prev = b.clear();
        assert_eq!(prev.email(), Some("x@y.com"));
        assert_eq!(a.snapshot(), Session::anonymous());
    }

    #[test]
    fn tokens_are_random_and_url_safe() {
        let a = gen_token().unwrap();
        let b = gen_token().unwrap();
        assert_ne!(a, b);
        assert!(a.chars().any(|c| c != 'A'));
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn password_sign_in_then_sign_out() {
        let p = MemorySessionProvider::new();
        p.register(Identity::new("Ann@Pets.org").with_display_name("Ann"), "hunter2");
        assert_eq!(p.current_session().state(), SessionState::Anonymous);

        let s = p.sign_in(SignInMethod::password("ann@pets.org", "hunter2")).await.unwrap();
        assert_eq!(s.state(), SessionState::Authenticated);
        assert_eq!(p.current_session(), s);
        assert_eq!(s.identity.as_ref().and_then(|i| i.display_name.as_deref()), Some("Ann"));

        p.sign_out().await.unwrap();
        assert_eq!(p.current_session().state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn bad_password_leaves_session_untouched() {
        let p = MemorySessionProvider::with_session(Session::authenticated("old", Identity::new("a@b.com")));
        p.register(Identity::new("a@b.com"), "right");
        let err = p.sign_in(SignInMethod::password("a@b.com", "wrong")).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { code: 400, .. }));
        assert_eq!(p.current_session().credential(), Some("old"));

        let err = p.sign_in(SignInMethod::password("nobody@b.com", "x")).await.unwrap_err();
        assert_eq!(err.to_string(), "sign-in rejected (400): EMAIL_NOT_FOUND");
    }

    #[tokio::test]
    async fn provider_sign_in_is_unsupported() {
        let p = MemorySessionProvider::new();
        let err = p.sign_in(SignInMethod::provider("google.com", "idt")).await.unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedMethod("provider")));
    }

    #[tokio::test]
    async fn ttl_sets_expiry() {
        let mut p = MemorySessionProvider::new();
        p.ttl = Some(Duration::from_secs(3600));
        p.register(Identity::new("a@b.com"), "pw");
        let s = p.sign_in(SignInMethod::password("a@b.com", "pw")).await.unwrap();
        let exp = s.expires_at.expect("expiry");
        assert!(exp > Utc::now());
    }
}
