//! Route registry
//!
//! Insertion-ordered set of attached applications. Attach order matters:
//! options and routes come from the first attached application declaring
//! the path, never merged across applications.

use super::app::{ClientInfo, RouteHandle, SockJsApp};
use super::options::RouteOptions;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the ordered set of mounted sub-applications
#[derive(Default)]
pub struct RouteRegistry {
    apps: RwLock<Vec<Arc<dyn SockJsApp>>>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an application; returns `false` without mutation when an
    /// application with the same identity is already attached.
    pub fn attach(&self, app: Arc<dyn SockJsApp>) -> bool {
        let mut apps = self.apps.write();
        if apps.iter().any(|a| a.id() == app.id()) {
            return false;
        }

        tracing::debug!(app = %app.id(), "Application attached");
        apps.push(app);
        true
    }

    /// Detach an application; returns `false` when it was not attached.
    pub fn detach(&self, app: &dyn SockJsApp) -> bool {
        let mut apps = self.apps.write();
        let before = apps.len();
        apps.retain(|a| a.id() != app.id());

        let removed = apps.len() < before;
        if removed {
            tracing::debug!(app = %app.id(), "Application detached");
        }
        removed
    }

    /// Whether an application with this identity is attached
    #[must_use]
    pub fn is_attached(&self, id: &str) -> bool {
        self.apps.read().iter().any(|a| a.id() == id)
    }

    /// Number of attached applications
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.apps.read().len()
    }

    /// Stable snapshot of the attached set in attach order
    ///
    /// Callers iterate the snapshot, so a handler may detach an application
    /// mid-iteration without invalidating anything.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn SockJsApp>> {
        self.apps.read().clone()
    }

    /// True when any attached application declares this exact mount path
    #[must_use]
    pub fn route_exists(&self, path: &str) -> bool {
        self.apps.read().iter().any(|a| a.route_exists(path))
    }

    /// Options of the first attached application declaring the path,
    /// overlaid on the defaults. Later matches are ignored.
    #[must_use]
    pub fn route_options(&self, path: &str) -> RouteOptions {
        let defaults = RouteOptions::default();
        for app in self.snapshot() {
            if app.route_exists(path) {
                if let Some(patch) = app.route_options(path) {
                    return defaults.apply(&patch);
                }
                break;
            }
        }
        defaults
    }

    /// Route handle from the first attached application matching the path
    #[must_use]
    pub fn get_route(&self, path: &str, client: &ClientInfo) -> Option<Arc<dyn RouteHandle>> {
        for app in self.snapshot() {
            if let Some(route) = app.get_route(path, client) {
                return Some(route);
            }
        }
        None
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("attached", &self.attached_count())
            .finish()
    }
}
