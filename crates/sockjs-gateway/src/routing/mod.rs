//! Request routing
//!
//! Mount-path matching, the protocol URL grammar, and the attached
//! application set.

mod app;
mod options;
mod registry;
mod resolver;

pub use app::{ClientInfo, ClientKind, Peer, RouteHandle, SockJsApp};
pub use options::{RouteOptions, RouteOptionsPatch};
pub use registry::RouteRegistry;
pub use resolver::{resolve, ResolvedRoute, ServerIdRule};
