//! The gateway core
//!
//! Owns the route registry, session manager, transport binder, and method
//! registry, and turns each incoming HTTP request head into a constructed
//! method handler.

use crate::binder::TransportBinder;
use crate::dispatch::{MethodContext, MethodHandler, MethodRegistry};
use crate::routing::{resolve, RouteRegistry, SockJsApp};
use crate::session::SessionManager;
use axum::http::request::Parts;
use sockjs_common::ProtocolConfig;
use sockjs_coordinator::Coordinator;
use std::sync::Arc;

pub struct Gateway {
    config: ProtocolConfig,
    registry: Arc<RouteRegistry>,
    sessions: Arc<SessionManager>,
    binder: TransportBinder,
    methods: MethodRegistry,
    coordinator: Arc<Coordinator>,
}

impl Gateway {
    #[must_use]
    pub fn new(config: ProtocolConfig, coordinator: Arc<Coordinator>) -> Self {
        let registry = Arc::new(RouteRegistry::new());
        let sessions = Arc::new(SessionManager::new(registry.clone(), coordinator.clone()));
        let binder = TransportBinder::new(registry.clone(), coordinator.clone(), config.heartbeat());

        Self {
            config,
            registry,
            sessions,
            binder,
            methods: MethodRegistry::builtin(),
            coordinator,
        }
    }

    /// Resolve a request head and construct the matching method handler
    ///
    /// A path that resolves to no mount, or to an invalid grammar, still
    /// yields a handler: the NotFound one. Callers always get something to
    /// run.
    #[must_use]
    pub fn begin_request(&self, parts: Parts) -> Box<dyn MethodHandler> {
        let path = parts.uri.path().to_string();

        let route = match resolve(&path, &self.registry) {
            Ok(route) => route,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Request resolved to no route");
                return self
                    .methods
                    .call_method("NotFound", MethodContext::unresolved(parts));
            }
        };

        tracing::debug!(
            path = %path,
            mount = %route.mount_path,
            method = %route.method,
            "Resolved request"
        );

        let ctx = MethodContext {
            mount_path: Some(route.mount_path),
            server_id: route.server_id,
            session_id: route.session_id,
            parts,
        };
        let mut handler = self.methods.call_method(&route.method, ctx);

        if let Some(version) = route.iframe_version {
            if !version.is_empty() && handler.name() == "Iframe" {
                handler.attach_version(&version);
            }
        }

        handler
    }

    /// Mount an application and bind the transport hook
    pub fn attach(&self, app: Arc<dyn SockJsApp>) -> bool {
        self.binder.attach(app)
    }

    /// Unmount an application and unbind the transport hook
    pub fn detach(&self, app: &dyn SockJsApp) -> bool {
        self.binder.detach(app)
    }

    /// Register an additional transport-method handler
    pub fn register_method(&mut self, name: &str, factory: crate::dispatch::MethodFactory) {
        self.methods.register(name, factory);
    }

    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    #[must_use]
    pub fn binder(&self) -> &TransportBinder {
        &self.binder
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.binder.detach_all();
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("apps", &self.registry.attached_count())
            .field("sessions", &self.sessions.session_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoApp;
    use axum::http::Request;
    use sockjs_coordinator::{RedisPool, RedisPoolConfig, SubscriberConfig};

    fn test_gateway() -> Gateway {
        let config = ProtocolConfig::default();
        let pool = RedisPool::new(RedisPoolConfig::default()).unwrap();
        let coordinator = Arc::new(Coordinator::new(
            pool,
            SubscriberConfig::default(),
            config.key_namespace.clone(),
        ));
        Gateway::new(config, coordinator)
    }

    fn parts_for(path: &str) -> Parts {
        let (parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_begin_request_dispatches_by_path() {
        let gateway = test_gateway();
        gateway.attach(Arc::new(EchoApp::new("echo", "/echo")));

        assert_eq!(gateway.begin_request(parts_for("/echo")).name(), "Welcome");
        assert_eq!(gateway.begin_request(parts_for("/echo/info")).name(), "Info");
        assert_eq!(
            gateway.begin_request(parts_for("/echo/iframe.html")).name(),
            "Iframe"
        );
        assert_eq!(
            gateway
                .begin_request(parts_for("/echo/000/sess1/websocket"))
                .name(),
            "Websocket"
        );
    }

    #[tokio::test]
    async fn test_begin_request_unresolved_is_not_found() {
        let gateway = test_gateway();
        gateway.attach(Arc::new(EchoApp::new("echo", "/echo")));

        assert_eq!(
            gateway.begin_request(parts_for("/missing")).name(),
            "NotFound"
        );
        // Unknown transport on a valid mount also falls through
        assert_eq!(
            gateway
                .begin_request(parts_for("/echo/000/sess1/nosuch"))
                .name(),
            "NotFound"
        );
    }

    #[tokio::test]
    async fn test_attach_detach_round_trip() {
        let gateway = test_gateway();
        let app = Arc::new(EchoApp::new("echo", "/echo"));

        assert!(gateway.attach(app.clone()));
        assert!(!gateway.attach(app.clone()));
        assert!(gateway.detach(app.as_ref()));
        assert!(!gateway.detach(app.as_ref()));
    }
}
