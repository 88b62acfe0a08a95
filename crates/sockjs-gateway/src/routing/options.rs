//! Route options
//!
//! Capability flags a mounted application declares per mount path, exposed
//! to clients through the `info` method.

use serde::Serialize;

/// Resolved per-route options with documented defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOptions {
    /// Raw WebSocket upgrade permitted
    pub websocket: bool,
    /// Allowed cross-origin patterns
    pub origins: Vec<String>,
    /// Server advertises that clients should send a tracking cookie
    pub cookie_needed: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            websocket: true,
            origins: vec!["*:*".to_string()],
            cookie_needed: false,
        }
    }
}

impl RouteOptions {
    /// Overlay an application's declared options onto the defaults
    ///
    /// Merged by explicit field assignment; unspecified fields keep their
    /// defaults.
    #[must_use]
    pub fn apply(mut self, patch: &RouteOptionsPatch) -> Self {
        if let Some(websocket) = patch.websocket {
            self.websocket = websocket;
        }
        if let Some(origins) = &patch.origins {
            self.origins = origins.clone();
        }
        if let Some(cookie_needed) = patch.cookie_needed {
            self.cookie_needed = cookie_needed;
        }
        self
    }
}

/// Partial options as declared by a mounted application
#[derive(Debug, Clone, Default)]
pub struct RouteOptionsPatch {
    pub websocket: Option<bool>,
    pub origins: Option<Vec<String>>,
    pub cookie_needed: Option<bool>,
}

impl RouteOptionsPatch {
    /// Patch that leaves every default in place
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn websocket(mut self, allowed: bool) -> Self {
        self.websocket = Some(allowed);
        self
    }

    #[must_use]
    pub fn origins(mut self, origins: Vec<String>) -> Self {
        self.origins = Some(origins);
        self
    }

    #[must_use]
    pub fn cookie_needed(mut self, needed: bool) -> Self {
        self.cookie_needed = Some(needed);
        self
    }
}
