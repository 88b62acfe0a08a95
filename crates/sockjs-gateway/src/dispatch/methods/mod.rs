//! Built-in transport-method handlers
//!
//! Streaming and polling transports register here the same way; the
//! built-ins cover the protocol's bootstrap surface.

pub mod iframe;
pub mod info;
pub mod not_found;
pub mod raw_websocket;
pub mod welcome;

pub use iframe::Iframe;
pub use info::Info;
pub use not_found::NotFound;
pub use raw_websocket::RawWebSocket;
pub use welcome::Welcome;
