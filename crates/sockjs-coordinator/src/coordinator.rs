//! Namespaced coordination facade.
//!
//! Every key and channel is prefixed with one configured namespace string
//! before it reaches the backend, so session presence, cross-worker locks,
//! and message fan-out share a single namespacing rule and the prefix is
//! changeable via one configuration value.
//!
//! The coordinator offers no locking beyond `set_nx`; callers use it to
//! implement at-most-one-owner semantics for a session. Backend failures
//! come back through the same `Result` channel as success, and the
//! coordinator never retries on its own.

use crate::pool::{BackendResult, RedisPool};
use crate::subscriber::{ReceivedMessage, Subscriber, SubscriberConfig};
use dashmap::DashMap;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::broadcast;

/// Keyed facade over the shared Redis backend
pub struct Coordinator {
    pool: RedisPool,
    subscriber: Subscriber,
    namespace: String,
    /// Per-channel count of subscribers on this worker (unprefixed names)
    local_subscribers: DashMap<String, usize>,
}

impl Coordinator {
    /// Create a coordinator over an existing pool
    ///
    /// Spawns the pub/sub listener task immediately; the key/value side
    /// stays lazy until the first command.
    #[must_use]
    pub fn new(pool: RedisPool, subscriber_config: SubscriberConfig, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            subscriber: Subscriber::new(subscriber_config),
            namespace: namespace.into(),
            local_subscribers: DashMap::new(),
        }
    }

    /// The configured namespace prefix
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix a key or channel with the configured namespace
    #[must_use]
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    /// Set a key to a value
    pub async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let mut conn = self.pool.get().await?;
        conn.set::<_, _, ()>(self.namespaced(key), value).await?;
        Ok(())
    }

    /// Set a key only if it does not exist; returns whether it was set
    pub async fn set_nx(&self, key: &str, value: &str) -> BackendResult<bool> {
        let mut conn = self.pool.get().await?;
        let set: bool = conn.set_nx(self.namespaced(key), value).await?;
        Ok(set)
    }

    /// Set expiry on a key; returns whether the key existed
    pub async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool> {
        let mut conn = self.pool.get().await?;
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let result: bool = conn.expire(self.namespaced(key), ttl).await?;
        Ok(result)
    }

    /// Publish a payload to a channel; returns the backend receiver count
    pub async fn publish(&self, channel: &str, payload: &str) -> BackendResult<u32> {
        let mut conn = self.pool.get().await?;
        let full = self.namespaced(channel);
        let receivers: u32 = conn.publish(&full, payload).await?;

        tracing::debug!(channel = %full, receivers = receivers, "Published message");

        Ok(receivers)
    }

    /// Subscribe this worker to a channel
    ///
    /// The wire subscription is established when the first local subscriber
    /// arrives; later calls only bump the local count. The returned receiver
    /// carries every message this worker is subscribed to; filter on
    /// [`Coordinator::namespaced`] of the channel name.
    pub async fn subscribe(&self, channel: &str) -> BackendResult<broadcast::Receiver<ReceivedMessage>> {
        let mut first = false;
        self.local_subscribers
            .entry(channel.to_string())
            .and_modify(|count| *count += 1)
            .or_insert_with(|| {
                first = true;
                1
            });

        if first {
            if let Err(e) = self.subscriber.subscribe(self.namespaced(channel)).await {
                // Roll back the count so a later subscriber retries the wire
                self.local_subscribers.remove_if_mut(channel, |_, count| {
                    *count = count.saturating_sub(1);
                    *count == 0
                });
                return Err(e);
            }
        }

        Ok(self.subscriber.receiver())
    }

    /// Drop one local subscription to a channel
    ///
    /// The wire subscription is released when the last local subscriber
    /// leaves. Unsubscribing from a channel with no local subscribers is a
    /// no-op.
    pub async fn unsubscribe(&self, channel: &str) -> BackendResult<()> {
        let mut last = false;
        self.local_subscribers.remove_if_mut(channel, |_, count| {
            *count = count.saturating_sub(1);
            last = *count == 0;
            last
        });

        if last {
            self.subscriber.unsubscribe(self.namespaced(channel)).await?;
        }

        Ok(())
    }

    /// Number of subscribers to a channel on this worker
    #[must_use]
    pub fn local_subscriber_count(&self, channel: &str) -> usize {
        self.local_subscribers
            .get(channel)
            .map_or(0, |count| *count)
    }

    /// Check backend health
    pub async fn health_check(&self) -> BackendResult<()> {
        self.pool.health_check().await
    }

    /// Shut down the pub/sub listener
    pub async fn shutdown(&self) -> BackendResult<()> {
        self.subscriber.shutdown().await
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("namespace", &self.namespace)
            .field("local_channels", &self.local_subscribers.len())
            .finish()
    }
}
