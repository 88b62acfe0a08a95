//! Echo application
//!
//! The canonical protocol test application: every message a peer sends
//! comes straight back to it. Ships with the gateway both as the default
//! mounted application and as the reference [`SockJsApp`] implementation.

use crate::binder::TransportBinding;
use crate::routing::{ClientInfo, Peer, RouteHandle, RouteOptionsPatch, SockJsApp};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct EchoApp {
    id: String,
    mount: String,
    options: Option<RouteOptionsPatch>,
    route: Arc<EchoRoute>,
    bindings: Mutex<HashMap<String, TransportBinding>>,
}

impl EchoApp {
    #[must_use]
    pub fn new(id: impl Into<String>, mount: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mount: mount.into(),
            options: None,
            route: Arc::new(EchoRoute),
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Create an echo application with a generated identity
    ///
    /// Registry identity is the application id, so generated ids let several
    /// instances mount at different paths without the caller naming each.
    #[must_use]
    pub fn mounted(mount: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), mount)
    }

    /// Override route options reported for this mount
    #[must_use]
    pub fn with_options(mut self, options: RouteOptionsPatch) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn mount(&self) -> &str {
        &self.mount
    }
}

impl SockJsApp for EchoApp {
    fn id(&self) -> &str {
        &self.id
    }

    fn route_exists(&self, path: &str) -> bool {
        self.mount == path
    }

    fn get_route(&self, path: &str, client: &ClientInfo) -> Option<Arc<dyn RouteHandle>> {
        if !self.route_exists(path) {
            return None;
        }
        tracing::debug!(
            app = %self.id,
            mount = %path,
            kind = ?client.kind,
            "Echo route requested"
        );
        Some(self.route.clone())
    }

    fn route_options(&self, path: &str) -> Option<RouteOptionsPatch> {
        if self.route_exists(path) {
            self.options.clone()
        } else {
            None
        }
    }

    fn bind(&self, hook: &str, binding: TransportBinding) {
        self.bindings.lock().insert(hook.to_string(), binding);
    }

    fn unbind(&self, hook: &str) {
        self.bindings.lock().remove(hook);
    }
}

/// Route handle that reflects every message back to its sender
pub struct EchoRoute;

impl RouteHandle for EchoRoute {
    fn on_handshake(&self, peer: &dyn Peer) {
        tracing::debug!(session = %peer.key(), "Echo peer attached");
    }

    fn on_message(&self, peer: &dyn Peer, payload: &str) {
        peer.send(payload);
    }

    fn on_finish(&self, peer: &dyn Peer) {
        tracing::debug!(session = %peer.key(), "Echo peer detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKey;

    struct StubPeer {
        key: SessionKey,
        sent: Mutex<Vec<String>>,
    }

    impl Peer for StubPeer {
        fn key(&self) -> &SessionKey {
            &self.key
        }

        fn send(&self, payload: &str) {
            self.sent.lock().push(payload.to_string());
        }
    }

    #[test]
    fn test_echoes_messages() {
        let peer = StubPeer {
            key: SessionKey::new("000", "sess1").unwrap(),
            sent: Mutex::new(Vec::new()),
        };
        let route = EchoRoute;

        route.on_handshake(&peer);
        route.on_message(&peer, "a[\"hi\"]");
        route.on_finish(&peer);

        assert_eq!(peer.sent.lock().as_slice(), ["a[\"hi\"]"]);
    }

    #[test]
    fn test_route_only_at_declared_mount() {
        let app = EchoApp::new("echo", "/echo");
        let info = ClientInfo::upgrade("000", "sess1");

        assert!(app.route_exists("/echo"));
        assert!(!app.route_exists("/echo/sub"));
        assert!(app.get_route("/echo", &info).is_some());
        assert!(app.get_route("/other", &info).is_none());
    }

    #[test]
    fn test_mounted_instances_get_distinct_identities() {
        use crate::routing::RouteRegistry;

        let a = Arc::new(EchoApp::mounted("/echo"));
        let b = Arc::new(EchoApp::mounted("/echo2"));
        assert_ne!(a.id(), b.id());

        let registry = RouteRegistry::new();
        assert!(registry.attach(a));
        assert!(registry.attach(b));
        assert_eq!(registry.attached_count(), 2);
    }

    #[test]
    fn test_options_reported_for_declared_mount_only() {
        let app = EchoApp::new("echo", "/echo")
            .with_options(RouteOptionsPatch::empty().websocket(false));

        assert!(app.route_options("/echo").is_some());
        assert!(app.route_options("/other").is_none());
    }
}
