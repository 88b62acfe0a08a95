//! Redis pub/sub listener.
//!
//! One background task per worker holds the pub/sub connection, fans
//! received messages out over a broadcast channel, and takes
//! subscribe/unsubscribe commands over a control channel. Reconnects with a
//! fixed delay when the connection drops; subscriptions are replayed from
//! the tracked set after reconnect.

use crate::pool::{BackendError, BackendResult};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Message received from the backend
///
/// The channel name is exactly as it appeared on the wire, namespace prefix
/// included.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub channel: String,
    pub payload: String,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Broadcast buffer size for fan-out
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Acknowledgement side of a subscription command
type CommandAck = oneshot::Sender<BackendResult<()>>;

/// Commands for subscription management
///
/// Subscribe and unsubscribe carry an ack the listener resolves once the
/// wire operation has actually run, so callers learn about failures.
enum SubscriberCommand {
    Subscribe(String, CommandAck),
    Unsubscribe(String, CommandAck),
    Shutdown,
}

/// Redis pub/sub subscriber
pub struct Subscriber {
    /// Channels currently subscribed on the wire
    subscribed: Arc<RwLock<HashSet<String>>>,
    /// Broadcast sender for received messages
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let subscribed = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(Self::listener_loop(
            config,
            subscribed.clone(),
            broadcast_tx.clone(),
            control_rx,
        ));

        Self {
            subscribed,
            broadcast_tx,
            control_tx,
        }
    }

    /// Background listener loop with reconnection
    async fn listener_loop(
        config: SubscriberConfig,
        subscribed: Arc<RwLock<HashSet<String>>>,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &subscribed, &broadcast_tx, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    if Self::fail_pending_commands(&mut control_rx) {
                        tracing::info!("Subscriber shutting down");
                        break;
                    }
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown; returns true on shutdown
    async fn run_listener(
        config: &SubscriberConfig,
        subscribed: &Arc<RwLock<HashSet<String>>>,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> BackendResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Replay subscriptions after (re)connect
        {
            let channels = subscribed.read().await;
            for channel in channels.iter() {
                pubsub.subscribe(channel).await?;
            }
        }

        tracing::info!("Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(msg) => {
                            let channel = msg.get_channel_name().to_string();
                            let payload: String = msg.get_payload().unwrap_or_default();

                            tracing::trace!(channel = %channel, "Received pub/sub message");

                            // Ignore send errors - no receivers right now
                            let _ = broadcast_tx.send(ReceivedMessage { channel, payload });
                        }
                        None => {
                            tracing::warn!("Pub/sub stream ended");
                            return Ok(false);
                        }
                    }
                }

                cmd = control_rx.recv() => {
                    let Some(cmd) = cmd else { return Ok(true) };
                    if matches!(cmd, SubscriberCommand::Shutdown) {
                        return Ok(true);
                    }

                    // The stream borrows pubsub; drop it to issue commands
                    drop(stream);
                    Self::apply_command(&mut pubsub, subscribed, cmd).await;
                    stream = pubsub.on_message();
                }
            }
        }
    }

    /// Apply one subscribe/unsubscribe command to the live connection
    async fn apply_command(
        pubsub: &mut redis::aio::PubSub,
        subscribed: &Arc<RwLock<HashSet<String>>>,
        cmd: SubscriberCommand,
    ) {
        match cmd {
            SubscriberCommand::Subscribe(channel, ack) => {
                let result = pubsub.subscribe(&channel).await;
                match &result {
                    Ok(()) => {
                        subscribed.write().await.insert(channel.clone());
                        tracing::debug!(channel = %channel, "Subscribed to channel");
                    }
                    Err(e) => {
                        tracing::error!(channel = %channel, error = %e, "Failed to subscribe");
                    }
                }
                let _ = ack.send(result.map_err(BackendError::from));
            }
            SubscriberCommand::Unsubscribe(channel, ack) => {
                let result = pubsub.unsubscribe(&channel).await;
                match &result {
                    Ok(()) => {
                        subscribed.write().await.remove(&channel);
                        tracing::debug!(channel = %channel, "Unsubscribed from channel");
                    }
                    Err(e) => {
                        tracing::error!(channel = %channel, error = %e, "Failed to unsubscribe");
                    }
                }
                let _ = ack.send(result.map_err(BackendError::from));
            }
            SubscriberCommand::Shutdown => {}
        }
    }

    /// Fail commands queued while the connection is down
    ///
    /// Their acks resolve with [`BackendError::NotConnected`] instead of
    /// waiting out the reconnect. Returns true when a shutdown was queued or
    /// the control channel is closed.
    fn fail_pending_commands(control_rx: &mut mpsc::Receiver<SubscriberCommand>) -> bool {
        loop {
            match control_rx.try_recv() {
                Ok(SubscriberCommand::Subscribe(_, ack))
                | Ok(SubscriberCommand::Unsubscribe(_, ack)) => {
                    let _ = ack.send(Err(BackendError::NotConnected));
                }
                Ok(SubscriberCommand::Shutdown) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    return true;
                }
                Err(mpsc::error::TryRecvError::Empty) => return false,
            }
        }
    }

    /// Subscribe to a channel on the wire
    ///
    /// Resolves once the listener has issued the wire subscription; a
    /// backend failure comes back here rather than being swallowed.
    pub async fn subscribe(&self, channel: impl Into<String>) -> BackendResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.control_tx
            .send(SubscriberCommand::Subscribe(channel.into(), ack_tx))
            .await
            .map_err(|_| BackendError::SubscriberClosed)?;
        ack_rx.await.map_err(|_| BackendError::SubscriberClosed)?
    }

    /// Unsubscribe from a channel on the wire
    pub async fn unsubscribe(&self, channel: impl Into<String>) -> BackendResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.control_tx
            .send(SubscriberCommand::Unsubscribe(channel.into(), ack_tx))
            .await
            .map_err(|_| BackendError::SubscriberClosed)?;
        ack_rx.await.map_err(|_| BackendError::SubscriberClosed)?
    }

    /// Get a receiver for all messages this worker is subscribed to
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Channels currently subscribed on the wire
    pub async fn subscribed_channels(&self) -> Vec<String> {
        self.subscribed.read().await.iter().cloned().collect()
    }

    /// Shut down the background listener
    pub async fn shutdown(&self) -> BackendResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| BackendError::SubscriberClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_config_default() {
        let config = SubscriberConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.broadcast_buffer, 1024);
        assert_eq!(config.reconnect_delay_ms, 1000);
    }
}
