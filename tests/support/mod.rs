//! Shared fakes for the integration tests: an in-process backend bound to an
//! ephemeral localhost port, and recording session/navigation collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use petify::navigation::{Navigator, Route};
use petify::{AuthError, Session, SessionProvider, SignInMethod};

/// What the fake backend saw for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Backend {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    pub fn seen(&self) -> Vec<Seen> { self.seen.lock().clone() }

    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: Value) {
        let h = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        self.seen.lock().push(Seen {
            method: method.to_string(),
            path,
            authorization: h("authorization"),
            request_id: h("x-request-id"),
            body,
        });
    }
}

async fn list_by_email(
    State(b): State<Backend>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let email = q.get("email").cloned().unwrap_or_default();
    b.record("GET", format!("/{}", resource), &headers, Value::Null);
    Json(json!([{"resource": resource, "email": email}]))
}

async fn create_user(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    b.record("POST", "/users".into(), &headers, body.clone());
    (StatusCode::CREATED, Json(json!({"insertedId": "u-1", "received": body})))
}

async fn with_status(State(b): State<Backend>, Path(code): Path<u16>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.record("ANY", format!("/status/{}", code), &headers, Value::Null);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"code": code, "message": status.canonical_reason().unwrap_or("")})))
}

async fn expired_payments(State(b): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.record("GET", "/payments".into(), &headers, Value::Null);
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized access"})))
}

async fn echo(State(b): State<Backend>, Path(rest): Path<String>, headers: HeaderMap, raw: Bytes) -> Json<Value> {
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
    b.record("ECHO", format!("/echo/{}", rest), &headers, body.clone());
    Json(json!({"path": rest, "body": body}))
}

/// Start the fake backend; returns its state handle and base URL.
pub async fn spawn_backend() -> (Backend, String) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/users", post(create_user))
        .route("/payments", get(expired_payments))
        .route("/status/{code}", any(with_status))
        .route("/echo/{*rest}", any(echo))
        .route("/{resource}", get(list_by_email))
        .with_state(backend.clone());
    (backend, serve(app).await)
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Ordered log of collaborator side effects, shared by the fakes below.
#[derive(Default)]
pub struct Events(Mutex<Vec<String>>);

impl Events {
    pub fn push<S: Into<String>>(&self, e: S) { self.0.lock().push(e.into()); }
    pub fn all(&self) -> Vec<String> { self.0.lock().clone() }
    pub fn count(&self, e: &str) -> usize { self.0.lock().iter().filter(|x| x.as_str() == e).count() }
}

pub struct FakeSessions {
    pub session: Mutex<Session>,
    pub fail_sign_out: bool,
    pub sign_out_delay: Option<Duration>,
    pub sign_outs: AtomicUsize,
    pub events: Arc<Events>,
}

impl FakeSessions {
    pub fn new(session: Session, events: Arc<Events>) -> Self {
        Self { session: Mutex::new(session), fail_sign_out: false, sign_out_delay: None, sign_outs: AtomicUsize::new(0), events }
    }

    pub fn sign_out_calls(&self) -> usize { self.sign_outs.load(Ordering::SeqCst) }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    fn current_session(&self) -> Session { self.session.lock().clone() }

    async fn sign_in(&self, _method: SignInMethod) -> Result<Session, AuthError> { Err(AuthError::UnsupportedMethod("fake")) }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(d) = self.sign_out_delay {
            tokio::time::sleep(d).await;
        }
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.events.push("sign_out");
        if self.fail_sign_out {
            return Err(AuthError::rejected(503, "NETWORK_REQUEST_FAILED"));
        }
        *self.session.lock() = Session::anonymous();
        Ok(())
    }
}

pub struct FakeNavigator {
    pub events: Arc<Events>,
}

impl Navigator for FakeNavigator {
    fn redirect_to(&self, route: Route) {
        let name = match route {
            Route::SignIn => "redirect:sign_in",
            Route::Forbidden => "redirect:forbidden",
        };
        self.events.push(name);
    }
}
