//! Navigation capability used by the HTTP client to move the user away from a
//! view after an authorization failure.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    SignIn,
    Forbidden,
}

/// Concrete view paths for each [`Route`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePaths {
    pub sign_in: String,
    pub forbidden: String,
}

impl Default for RoutePaths {
    fn default() -> Self { Self { sign_in: "/login".into(), forbidden: "/forbidden".into() } }
}

impl RoutePaths {
    pub fn path_for(&self, route: Route) -> &str {
        match route {
            Route::SignIn => &self.sign_in,
            Route::Forbidden => &self.forbidden,
        }
    }
}

pub trait Navigator: Send + Sync {
    fn redirect_to(&self, route: Route);
}

/// Navigator that keeps the visited paths in order and logs every redirect.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    paths: RoutePaths,
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(paths: RoutePaths) -> Self { Self { paths, history: Mutex::new(Vec::new()) } }

    pub fn current(&self) -> Option<String> { self.history.lock().last().cloned() }

    pub fn history(&self) -> Vec<String> { self.history.lock().clone() }
}

impl Navigator for HistoryNavigator {
    fn redirect_to(&self, route: Route) {
        let path = self.paths.path_for(route).to_string();
        info!(target: "navigation", ?route, path = %path, "redirect");
        self.history.lock().push(path);
    }
}
