//! Session state

use crate::routing::{Peer, RouteHandle};
use sockjs_common::{GatewayError, GatewayResult};
use sockjs_coordinator::Coordinator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identity of a session: unique only as the (server id, session id) pair
///
/// Neither token may contain the path separator, since keys derived from
/// the pair are embedded in coordinator key and channel names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub server_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(server_id: impl Into<String>, session_id: impl Into<String>) -> GatewayResult<Self> {
        let server_id = server_id.into();
        let session_id = session_id.into();

        if server_id.contains('/') || session_id.contains('/') {
            return Err(GatewayError::SessionCreationFailed(format!(
                "{server_id}/{session_id}"
            )));
        }

        Ok(Self {
            server_id,
            session_id,
        })
    }

    /// Coordinator key marking this session's presence across workers
    #[must_use]
    pub fn presence_key(&self) -> String {
        format!("s:{self}")
    }

    /// Pub/sub channel carrying frames from any worker to this client
    #[must_use]
    pub fn downstream_channel(&self) -> String {
        format!("s2c:{self}")
    }

    /// Pub/sub channel carrying client messages to the owning worker
    #[must_use]
    pub fn upstream_channel(&self) -> String {
        format!("c2s:{self}")
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.server_id, self.session_id)
    }
}

/// One logical client session
///
/// Owned exclusively by the [`SessionManager`](super::SessionManager)'s
/// active set while alive; transport handlers hold non-owning references.
pub struct Session {
    key: SessionKey,
    mount_path: String,
    route: Arc<dyn RouteHandle>,
    coordinator: Arc<Coordinator>,
    handshaken: AtomicBool,
}

impl Session {
    pub(super) fn new(
        key: SessionKey,
        mount_path: impl Into<String>,
        route: Arc<dyn RouteHandle>,
        coordinator: Arc<Coordinator>,
    ) -> Self {
        Self {
            key,
            mount_path: mount_path.into(),
            route,
            coordinator,
            handshaken: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    #[must_use]
    pub fn route(&self) -> &Arc<dyn RouteHandle> {
        &self.route
    }

    /// Coordinator key marking this session's presence across workers
    #[must_use]
    pub fn presence_key(&self) -> String {
        self.key.presence_key()
    }

    /// Pub/sub channel carrying frames from any worker to this client
    #[must_use]
    pub fn downstream_channel(&self) -> String {
        self.key.downstream_channel()
    }

    /// Pub/sub channel carrying client messages to the owning worker
    #[must_use]
    pub fn upstream_channel(&self) -> String {
        self.key.upstream_channel()
    }

    /// Run the route's handshake; subsequent calls are no-ops.
    pub(super) fn run_handshake(&self) {
        if !self.handshaken.swap(true, Ordering::SeqCst) {
            tracing::debug!(session = %self.key, path = %self.mount_path, "Session handshake");
            self.route.on_handshake(self);
        }
    }

    #[must_use]
    pub fn is_handshaken(&self) -> bool {
        self.handshaken.load(Ordering::SeqCst)
    }
}

impl Peer for Session {
    fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Fan the payload out to whichever worker currently services the
    /// client's transport.
    fn send(&self, payload: &str) {
        let coordinator = self.coordinator.clone();
        let channel = self.downstream_channel();
        let payload = payload.to_string();

        tokio::spawn(async move {
            if let Err(e) = coordinator.publish(&channel, &payload).await {
                tracing::warn!(channel = %channel, error = %e, "Failed to publish session payload");
            }
        });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key.to_string())
            .field("mount_path", &self.mount_path)
            .field("handshaken", &self.is_handshaken())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rejects_path_separator() {
        assert!(SessionKey::new("0", "sess/1").is_err());
        assert!(SessionKey::new("0/0", "sess1").is_err());
        assert!(SessionKey::new("0", "sess1").is_ok());
    }

    #[test]
    fn test_key_display() {
        let key = SessionKey::new("000", "sess1").unwrap();
        assert_eq!(key.to_string(), "000:sess1");
    }

    #[test]
    fn test_key_derived_names() {
        let key = SessionKey::new("000", "sess1").unwrap();
        assert_eq!(key.presence_key(), "s:000:sess1");
        assert_eq!(key.downstream_channel(), "s2c:000:sess1");
        assert_eq!(key.upstream_channel(), "c2s:000:sess1");
    }
}
