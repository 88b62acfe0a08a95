//! # sockjs-gateway
//!
//! SockJS protocol gateway: URL-grammar routing, transport-method dispatch,
//! session management, and native WebSocket transport over a Redis-backed
//! coordination layer.

pub mod binder;
pub mod dispatch;
pub mod echo;
pub mod gateway;
pub mod routing;
pub mod server;
pub mod session;

pub use gateway::Gateway;
pub use server::{create_app, create_gateway, run};
