//! Transport binder
//!
//! Attaches the gateway's connection callback to mounted applications and
//! handles connections arriving through a transport-native path (a genuine
//! protocol-level upgrade, as opposed to plain HTTP). Accepted connections
//! are wrapped in proxies that bind them to this gateway instance.

use crate::routing::{
    ClientInfo, Peer, RouteHandle, RouteRegistry, ServerIdRule, SockJsApp,
};
use crate::session::SessionKey;
use sockjs_common::{GatewayError, GatewayResult};
use sockjs_coordinator::{BackendResult, Coordinator};
use std::sync::Arc;
use std::time::Duration;

/// Hook name the gateway registers its connection callback under
pub const TRANSPORT_HOOK: &str = "sockjs-transport";

/// Minimal surface a native transport connection must expose
///
/// Implemented by the server's websocket handler; kept narrow so tests can
/// substitute an in-memory recorder.
pub trait RawConnection: Send + Sync {
    /// Queue a frame for delivery to the client
    fn send(&self, payload: &str);

    /// Close the underlying connection
    fn close(&self);
}

/// Parsed native-upgrade target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeTarget {
    pub mount_path: String,
    pub server_id: String,
    pub session_id: String,
}

/// Restricted parse for the native upgrade path
///
/// Unlike the HTTP resolver this requires the final segment to literally be
/// the websocket transport and the server identifier to be decimal digits.
pub fn parse_upgrade_path(path: &str) -> GatewayResult<UpgradeTarget> {
    let mut segments: Vec<&str> = path.split('/').collect();

    let method = segments.pop().unwrap_or_default();
    if method != "websocket" {
        return Err(GatewayError::InvalidTransportUpgrade(format!(
            "trailing segment {method:?} is not the websocket transport"
        )));
    }

    if segments.len() < 3 {
        return Err(GatewayError::InvalidTransportUpgrade(
            "too few path segments".to_string(),
        ));
    }

    let server = segments[segments.len() - 2];
    if !ServerIdRule::DigitsOnly.allows(server) {
        return Err(GatewayError::InvalidTransportUpgrade(format!(
            "server identifier {server:?} is not decimal digits"
        )));
    }

    let session_id = segments.pop().unwrap_or_default().to_string();
    let server_id = segments.pop().unwrap_or_default().to_string();

    Ok(UpgradeTarget {
        mount_path: segments.join("/"),
        server_id,
        session_id,
    })
}

/// Gateway-bound wrapper around a raw native connection
pub struct ConnectionProxy {
    key: SessionKey,
    coordinator: Arc<Coordinator>,
    inner: Arc<dyn RawConnection>,
}

impl ConnectionProxy {
    fn new(key: SessionKey, coordinator: Arc<Coordinator>, inner: Arc<dyn RawConnection>) -> Self {
        Self {
            key,
            coordinator,
            inner,
        }
    }

    /// Coordinator handle for transports that need cross-worker state
    #[must_use]
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn close(&self) {
        self.inner.close();
    }

    /// Claim cross-worker ownership of this session
    ///
    /// At-most-one-owner: only the first worker's claim succeeds. The
    /// presence key expires after the dead-session timeout unless renewed.
    pub async fn claim(&self, dead_session_timeout: Duration) -> BackendResult<bool> {
        let presence = self.key.presence_key();
        let claimed = self.coordinator.set_nx(&presence, "1").await?;
        if claimed {
            self.coordinator.expire(&presence, dead_session_timeout).await?;
        }
        Ok(claimed)
    }

    /// Renew the presence key's expiry while the transport is serviced
    pub async fn touch(&self, dead_session_timeout: Duration) -> BackendResult<bool> {
        self.coordinator
            .expire(&self.key.presence_key(), dead_session_timeout)
            .await
    }
}

impl Peer for ConnectionProxy {
    fn key(&self) -> &SessionKey {
        &self.key
    }

    fn send(&self, payload: &str) {
        self.inner.send(payload);
    }
}

/// Gateway-bound wrapper around an application route
///
/// Forwards route events for one accepted native connection and carries the
/// gateway's heartbeat setting for the connection's service loop.
#[derive(Clone)]
pub struct RouteProxy {
    route: Arc<dyn RouteHandle>,
    client: Arc<ConnectionProxy>,
    heartbeat: Duration,
}

impl RouteProxy {
    /// Open the connection: emit the open frame, then hand the peer to the
    /// route's handshake.
    pub fn on_handshake(&self) {
        tracing::debug!(session = %self.client.key(), "Native transport handshake");
        self.client.send("o");
        self.route.on_handshake(self.client.as_ref());
    }

    pub fn on_message(&self, payload: &str) {
        self.route.on_message(self.client.as_ref(), payload);
    }

    pub fn on_finish(&self) {
        tracing::debug!(session = %self.client.key(), "Native transport finished");
        self.route.on_finish(self.client.as_ref());
    }

    /// Emit one heartbeat frame
    pub fn heartbeat(&self) {
        self.client.send("h");
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ConnectionProxy> {
        &self.client
    }
}

/// The connection callback handed to attached applications
#[derive(Clone)]
pub struct TransportBinding {
    coordinator: Arc<Coordinator>,
    heartbeat: Duration,
}

impl TransportBinding {
    /// Run one native connection against one application
    ///
    /// On success the caller-supplied state callback receives the accepted
    /// route proxy; on failure it receives `None` and nothing else happens.
    /// The return value says whether this application claimed the
    /// connection.
    pub fn handle_connection(
        &self,
        app: &dyn SockJsApp,
        path: &str,
        client: &Arc<dyn RawConnection>,
        state: &mut dyn FnMut(Option<RouteProxy>),
    ) -> bool {
        let target = match parse_upgrade_path(path) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Rejected native transport connection");
                state(None);
                return false;
            }
        };

        let info = ClientInfo::upgrade(&target.server_id, &target.session_id);
        let Some(route) = app.get_route(&target.mount_path, &info) else {
            state(None);
            return false;
        };

        // Segments never contain the separator, so this cannot fail here
        let Ok(key) = SessionKey::new(target.server_id, target.session_id) else {
            state(None);
            return false;
        };

        let proxy_client = Arc::new(ConnectionProxy::new(
            key,
            self.coordinator.clone(),
            client.clone(),
        ));
        state(Some(RouteProxy {
            route,
            client: proxy_client,
            heartbeat: self.heartbeat,
        }));
        true
    }
}

/// Attaches and detaches connection-accepting applications
pub struct TransportBinder {
    registry: Arc<RouteRegistry>,
    binding: TransportBinding,
}

impl TransportBinder {
    #[must_use]
    pub fn new(
        registry: Arc<RouteRegistry>,
        coordinator: Arc<Coordinator>,
        heartbeat: Duration,
    ) -> Self {
        Self {
            registry,
            binding: TransportBinding {
                coordinator,
                heartbeat,
            },
        }
    }

    /// Attach an application and register the connection callback
    ///
    /// Attaching an already-attached application is a no-op returning
    /// `false`.
    pub fn attach(&self, app: Arc<dyn SockJsApp>) -> bool {
        if !self.registry.attach(app.clone()) {
            return false;
        }
        app.bind(TRANSPORT_HOOK, self.binding.clone());
        true
    }

    /// Detach an application and unregister the callback
    pub fn detach(&self, app: &dyn SockJsApp) -> bool {
        if !self.registry.detach(app) {
            return false;
        }
        app.unbind(TRANSPORT_HOOK);
        true
    }

    /// Detach every attached application (gateway teardown)
    pub fn detach_all(&self) {
        for app in self.registry.snapshot() {
            self.detach(app.as_ref());
        }
    }

    /// Offer a native connection to the attached applications in order
    ///
    /// The first application to claim it wins.
    pub fn dispatch_upgrade(
        &self,
        path: &str,
        client: &Arc<dyn RawConnection>,
        state: &mut dyn FnMut(Option<RouteProxy>),
    ) -> bool {
        let apps = self.registry.snapshot();
        if apps.is_empty() {
            state(None);
            return false;
        }

        apps.iter()
            .any(|app| self.binding.handle_connection(app.as_ref(), path, client, &mut *state))
    }
}
