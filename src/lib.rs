//! Petify client core.
//!
//! An authenticated HTTP client for the Petify backend: bearer credentials are
//! attached from an injected [`identity::SessionProvider`], 403 responses send
//! the user to the forbidden view and 401 responses sign the user out and send
//! them to sign-in through an injected [`navigation::Navigator`].

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod navigation;

pub use client::{ApiClient, ApiResponse, PublicClient};
pub use config::{ClientConfig, IdentityConfig};
pub use error::{AuthError, ClientError, ConfigError, FailureKind, HttpFailure};
pub use identity::{Identity, Session, SessionProvider, SessionState, SignInMethod};
pub use navigation::{Navigator, Route, RoutePaths};
