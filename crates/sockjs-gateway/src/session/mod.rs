//! Session management
//!
//! A session represents one logical client across potentially many physical
//! transport connections.

mod manager;
mod session;

pub use manager::SessionManager;
pub use session::{Session, SessionKey};
