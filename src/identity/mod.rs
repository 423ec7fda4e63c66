//! Sessions and the providers that own them.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod request_context;
mod toolkit;

pub use principal::Identity;
pub use session::{Session, SessionState, SessionStore, MemorySessionProvider};
pub use provider::{SessionProvider, SignInMethod};
pub use request_context::RequestContext;
pub use toolkit::IdentityToolkitProvider;
