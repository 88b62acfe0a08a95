//! # sockjs-coordinator
//!
//! Redis-backed coordination layer for the SockJS gateway.
//!
//! A session created by one worker must remain reachable by requests that
//! land on any worker behind the load balancer, so session presence,
//! cross-worker locks, and message fan-out all go through one shared
//! backend. This crate provides:
//!
//! - **Connection pool**: managed Redis pool with deadpool
//! - **Coordinator**: get/set/setnx/expire/publish/subscribe with every key
//!   and channel prefixed by a configured namespace
//! - **Subscriber**: background pub/sub listener with reconnection
//!
//! ## Example
//!
//! ```ignore
//! use sockjs_coordinator::{Coordinator, RedisPool, RedisPoolConfig, SubscriberConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let coordinator = Coordinator::new(pool, SubscriberConfig::default(), "sockjs:");
//!
//! // At-most-one-owner claim for a session
//! if coordinator.set_nx("s:0:sess1", "1").await? {
//!     coordinator.expire("s:0:sess1", timeout).await?;
//! }
//! ```

pub mod coordinator;
pub mod pool;
pub mod subscriber;

pub use coordinator::Coordinator;
pub use pool::{BackendError, BackendResult, RedisPool, RedisPoolConfig};
pub use subscriber::{ReceivedMessage, Subscriber, SubscriberConfig};
