//! Mounted application interface
//!
//! The gateway owns no application logic itself; sub-applications implement
//! [`SockJsApp`] and are attached to the registry. Each declares the mount
//! paths it serves, hands out route handles, and accepts the gateway's
//! native-transport binding.

use super::options::RouteOptionsPatch;
use crate::binder::TransportBinding;
use crate::session::SessionKey;
use std::sync::Arc;

/// A sub-application mounted under one or more URL prefixes
pub trait SockJsApp: Send + Sync {
    /// Stable identity, used for attach/detach idempotence
    fn id(&self) -> &str;

    /// Whether this application declares the exact mount path
    fn route_exists(&self, path: &str) -> bool;

    /// Route handle for a declared mount path, or `None`
    fn get_route(&self, path: &str, client: &ClientInfo) -> Option<Arc<dyn RouteHandle>>;

    /// The application's option overrides for a declared mount path
    fn route_options(&self, path: &str) -> Option<RouteOptionsPatch>;

    /// Register the gateway's native-transport callback under a named hook
    fn bind(&self, hook: &str, binding: TransportBinding);

    /// Remove the callback registered under a named hook
    fn unbind(&self, hook: &str);
}

/// Application-facing handle for one route
///
/// Implementations receive lifecycle and message events for every peer the
/// gateway attaches to the route.
pub trait RouteHandle: Send + Sync {
    /// One-time initialization when a session or connection first attaches
    fn on_handshake(&self, peer: &dyn Peer);

    /// Application-level message from the client
    fn on_message(&self, peer: &dyn Peer, payload: &str);

    /// Peer detached; no further events follow for it
    fn on_finish(&self, peer: &dyn Peer);
}

/// One logical client as seen by a route handle
///
/// Either a coordinator-backed [`Session`](crate::session::Session) or a
/// gateway-bound native connection proxy.
pub trait Peer: Send + Sync {
    /// The (server id, session id) pair identifying this peer
    fn key(&self) -> &SessionKey;

    /// Send a payload back to the client
    fn send(&self, payload: &str);
}

/// Who is asking for a route
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub kind: ClientKind,
    pub server_id: Option<String>,
    pub session_id: Option<String>,
}

/// Entry point a route request arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Explicit session creation (polling/streaming transports)
    Session,
    /// Native protocol-level upgrade
    Upgrade,
}

impl ClientInfo {
    /// Context for imperative session creation
    #[must_use]
    pub fn session(key: &SessionKey) -> Self {
        Self {
            kind: ClientKind::Session,
            server_id: Some(key.server_id.clone()),
            session_id: Some(key.session_id.clone()),
        }
    }

    /// Context for a native transport upgrade
    #[must_use]
    pub fn upgrade(server_id: &str, session_id: &str) -> Self {
        Self {
            kind: ClientKind::Upgrade,
            server_id: Some(server_id.to_string()),
            session_id: Some(session_id.to_string()),
        }
    }
}
