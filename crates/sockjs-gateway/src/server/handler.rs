//! Request entry point
//!
//! One handler serves the whole URL grammar. A genuine protocol upgrade on
//! a `.../websocket` path goes to the native transport loop; everything
//! else is resolved to a method handler and executed as plain HTTP.

use crate::binder::{RawConnection, RouteProxy};
use crate::gateway::Gateway;
use crate::routing::Peer;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use sockjs_coordinator::ReceivedMessage;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;

/// Frames queued by the gateway for delivery to one socket
enum Outgoing {
    Frame(String),
    Close,
}

/// [`RawConnection`] backed by the socket's outgoing queue
struct SocketConnection {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl RawConnection for SocketConnection {
    fn send(&self, payload: &str) {
        // Receiver gone means the socket loop already ended
        let _ = self.tx.send(Outgoing::Frame(payload.to_string()));
    }

    fn close(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}

/// Catch-all gateway handler
pub async fn entry_handler(
    State(gateway): State<Arc<Gateway>>,
    ws: Option<WebSocketUpgrade>,
    request: Request<Body>,
) -> Response {
    let (parts, _body) = request.into_parts();

    if let Some(ws) = ws {
        if parts.uri.path().ends_with("/websocket") {
            let path = parts.uri.path().to_string();
            return ws
                .on_upgrade(move |socket| handle_socket(gateway, socket, path))
                .into_response();
        }
    }

    gateway.begin_request(parts).handle(&gateway).await
}

/// Service one upgraded native transport connection
async fn handle_socket(gateway: Arc<Gateway>, socket: WebSocket, path: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let client: Arc<dyn RawConnection> = Arc::new(SocketConnection { tx });
    let mut accepted: Option<RouteProxy> = None;
    gateway
        .binder()
        .dispatch_upgrade(&path, &client, &mut |route| accepted = route);

    let Some(proxy) = accepted else {
        tracing::debug!(path = %path, "No application claimed the connection");
        let _ = ws_sink.close().await;
        return;
    };

    let key = proxy.client().key().clone();
    tracing::info!(session = %key, "Native transport connection established");

    // Cross-worker presence claim; the key expires unless renewed below
    let dead_session_timeout = gateway.config().dead_session_timeout();
    match proxy.client().claim(dead_session_timeout).await {
        Ok(true) => tracing::debug!(session = %key, "Session presence claimed"),
        Ok(false) => tracing::warn!(session = %key, "Session already claimed by another worker"),
        Err(e) => tracing::warn!(session = %key, error = %e, "Presence claim unavailable"),
    }

    // Frames published for this session by other workers
    let downstream = key.downstream_channel();
    let wire_channel = gateway.coordinator().namespaced(&downstream);
    let mut remote = match gateway.coordinator().subscribe(&downstream).await {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::warn!(session = %key, error = %e, "Cross-worker delivery unavailable");
            None
        }
    };

    proxy.on_handshake();

    let mut heartbeat = interval(proxy.heartbeat_interval());
    // The first tick completes immediately
    heartbeat.tick().await;

    loop {
        tokio::select! {
            msg = ws_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => proxy.on_message(&text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(session = %key, error = %e, "WebSocket error");
                    break;
                }
            },

            out = rx.recv() => match out {
                Some(Outgoing::Frame(frame)) => {
                    if ws_sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outgoing::Close) | None => break,
            },

            msg = recv_remote(&mut remote) => {
                if msg.channel == wire_channel
                    && ws_sink.send(Message::Text(msg.payload.into())).await.is_err()
                {
                    break;
                }
            }

            _ = heartbeat.tick() => {
                proxy.heartbeat();

                let client = proxy.client().clone();
                tokio::spawn(async move {
                    if let Err(e) = client.touch(dead_session_timeout).await {
                        tracing::debug!(error = %e, "Presence renewal failed");
                    }
                });
            }
        }
    }

    proxy.on_finish();
    if let Err(e) = gateway.coordinator().unsubscribe(&downstream).await {
        tracing::debug!(session = %key, error = %e, "Unsubscribe failed during teardown");
    }
    let _ = ws_sink.close().await;

    tracing::info!(session = %key, "Native transport connection closed");
}

/// Next cross-worker message, pending forever when delivery is unavailable
async fn recv_remote(
    remote: &mut Option<broadcast::Receiver<ReceivedMessage>>,
) -> ReceivedMessage {
    let Some(rx) = remote else {
        return std::future::pending().await;
    };

    loop {
        match rx.recv().await {
            Ok(msg) => return msg,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Cross-worker receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
        }
    }
}
