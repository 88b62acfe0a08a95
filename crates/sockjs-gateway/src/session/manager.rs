//! Session manager
//!
//! Owns the live set of sessions for this worker using DashMap for
//! concurrent access; cross-worker visibility goes through the coordinator.

use super::session::{Session, SessionKey};
use crate::routing::{ClientInfo, RouteRegistry};
use dashmap::DashMap;
use sockjs_common::{GatewayError, GatewayResult};
use sockjs_coordinator::Coordinator;
use std::sync::Arc;

/// Creates, looks up, and destroys sessions
pub struct SessionManager {
    registry: Arc<RouteRegistry>,
    coordinator: Arc<Coordinator>,
    sessions: DashMap<SessionKey, Arc<Session>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(registry: Arc<RouteRegistry>, coordinator: Arc<Coordinator>) -> Self {
        Self {
            registry,
            coordinator,
            sessions: DashMap::new(),
        }
    }

    /// Create a session and run its handshake
    ///
    /// Attached applications are scanned in attach order; the first route
    /// match wins. With no match the session is discarded without ever
    /// entering the active set. The handshake runs exactly once,
    /// synchronously, before this returns.
    pub fn begin_session(
        &self,
        path: &str,
        session_id: &str,
        server_id: &str,
    ) -> GatewayResult<Arc<Session>> {
        let key = SessionKey::new(server_id, session_id)?;
        let client = ClientInfo::session(&key);

        let route = self
            .registry
            .get_route(path, &client)
            .ok_or_else(|| GatewayError::SessionCreationFailed(path.to_string()))?;

        let session = Arc::new(Session::new(
            key.clone(),
            path,
            route,
            self.coordinator.clone(),
        ));
        self.sessions.insert(key.clone(), session.clone());

        tracing::debug!(session = %key, path = %path, "Session created");

        session.run_handshake();
        Ok(session)
    }

    /// Remove a session from the active set
    ///
    /// Removing a session that was never added (or already removed) is a
    /// safe no-op.
    pub fn end_session(&self, session: &Session) {
        use crate::routing::Peer;

        if self.sessions.remove(session.key()).is_some() {
            tracing::debug!(session = %session.key(), "Session ended");
        }
    }

    /// Look up a live session
    #[must_use]
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|s| s.clone())
    }

    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Number of live sessions on this worker
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Stable snapshot of the active set
    ///
    /// Iteration-safe: a route handler may end sessions while the caller
    /// walks the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.iter().map(|s| s.clone()).collect()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoApp;
    use crate::routing::Peer;
    use sockjs_coordinator::{RedisPool, RedisPoolConfig, SubscriberConfig};

    fn test_manager(mounts: &[&str]) -> SessionManager {
        let registry = Arc::new(RouteRegistry::new());
        for (i, mount) in mounts.iter().enumerate() {
            registry.attach(Arc::new(EchoApp::new(format!("app{i}"), *mount)));
        }
        let pool = RedisPool::new(RedisPoolConfig::default()).unwrap();
        let coordinator = Arc::new(Coordinator::new(
            pool,
            SubscriberConfig::default(),
            "sockjs:",
        ));
        SessionManager::new(registry, coordinator)
    }

    #[tokio::test]
    async fn test_begin_session_runs_handshake_once() {
        let manager = test_manager(&["/echo"]);

        let session = manager.begin_session("/echo", "sess1", "000").unwrap();
        assert!(session.is_handshaken());
        assert_eq!(manager.session_count(), 1);
        assert!(manager.contains(session.key()));
    }

    #[tokio::test]
    async fn test_begin_session_without_route_adds_nothing() {
        let manager = test_manager(&["/echo"]);

        let err = manager.begin_session("/other", "sess1", "000").unwrap_err();
        assert!(matches!(err, GatewayError::SessionCreationFailed(_)));
        assert_eq!(manager.session_count(), 0);
    }

    #[tokio::test]
    async fn test_end_session_is_idempotent() {
        let manager = test_manager(&["/echo"]);

        let session = manager.begin_session("/echo", "sess1", "000").unwrap();
        manager.end_session(&session);
        assert_eq!(manager.session_count(), 0);

        // Ending a session that is no longer present is a safe no-op
        manager.end_session(&session);
        assert_eq!(manager.session_count(), 0);
    }

    #[tokio::test]
    async fn test_same_session_id_different_server() {
        let manager = test_manager(&["/echo"]);

        manager.begin_session("/echo", "sess1", "000").unwrap();
        manager.begin_session("/echo", "sess1", "001").unwrap();

        // Unique only as the (server id, session id) combination
        assert_eq!(manager.session_count(), 2);
    }

    #[tokio::test]
    async fn test_channel_names() {
        let manager = test_manager(&["/echo"]);
        let session = manager.begin_session("/echo", "sess1", "000").unwrap();

        assert_eq!(session.presence_key(), "s:000:sess1");
        assert_eq!(session.downstream_channel(), "s2c:000:sess1");
        assert_eq!(session.upstream_channel(), "c2s:000:sess1");
    }
}
