use uuid::Uuid;

use super::session::{Session, SessionState};

/// Per-request facts captured when the request is built: the id used to
/// correlate logs and the session state the request was sent under.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub state: SessionState,
    pub email: Option<String>,
}

impl RequestContext {
    pub fn for_session(session: &Session) -> Self {
        Self { request_id: Uuid::new_v4(), state: session.state(), email: session.email().map(str::to_string) }
    }
}

impl Default for RequestContext {
    fn default() -> Self { Self::for_session(&Session::anonymous()) }
}
