//! Method dispatch
//!
//! Maps a resolved method token to a concrete transport-method handler.
//! This registry is the sole extension point for adding new transport
//! methods: every handler conforms to [`MethodHandler`] and is produced by
//! a factory function keyed by normalized method name.

pub mod methods;

use crate::gateway::Gateway;
use axum::http::request::Parts;
use axum::response::Response;
use std::collections::HashMap;

/// Request-scoped context a handler is constructed with
#[derive(Debug)]
pub struct MethodContext {
    /// Mount path of the resolved route, absent when resolution failed
    pub mount_path: Option<String>,
    /// Server identifier from a transport path
    pub server_id: Option<String>,
    /// Session identifier from a transport path
    pub session_id: Option<String>,
    /// The HTTP request head
    pub parts: Parts,
}

impl MethodContext {
    /// Context for a request that never resolved to a route
    #[must_use]
    pub fn unresolved(parts: Parts) -> Self {
        Self {
            mount_path: None,
            server_id: None,
            session_id: None,
            parts,
        }
    }
}

/// One transport-method handler: handles one request against the gateway
#[async_trait::async_trait]
pub trait MethodHandler: Send {
    /// Stable handler name, used for logging and dispatch equality
    fn name(&self) -> &'static str;

    /// Attach the bootstrap version captured from an iframe URL
    ///
    /// Only the iframe handler overrides this; everywhere else it is a
    /// no-op.
    fn attach_version(&mut self, _version: &str) {}

    /// Produce the HTTP response for this request
    async fn handle(self: Box<Self>, gateway: &Gateway) -> Response;
}

/// Factory producing a freshly-constructed handler for one request
pub type MethodFactory = fn(MethodContext) -> Box<dyn MethodHandler>;

/// Normalize a method token: `_` is a word boundary, each word is
/// title-cased, words are concatenated. `not_found`, `NotFound`, and
/// `notFound` all normalize to `NotFound`.
#[must_use]
pub fn normalize_method(name: &str) -> String {
    let normalized: String = name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    // The reserved base name must never be dispatched directly
    if normalized.eq_ignore_ascii_case("generic") {
        "NotFound".to_string()
    } else {
        normalized
    }
}

/// Registry of transport-method handler factories
pub struct MethodRegistry {
    factories: HashMap<String, MethodFactory>,
}

impl MethodRegistry {
    /// Registry with the built-in methods: Welcome, Info, Iframe, NotFound,
    /// and the plain-HTTP Websocket rejection.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("welcome", methods::welcome::factory);
        registry.register("info", methods::info::factory);
        registry.register("iframe", methods::iframe::factory);
        registry.register("not_found", methods::not_found::factory);
        registry.register("websocket", methods::raw_websocket::factory);
        registry
    }

    /// Register a handler factory under a method name (normalized on entry)
    pub fn register(&mut self, name: &str, factory: MethodFactory) {
        self.factories.insert(normalize_method(name), factory);
    }

    /// Construct the handler for a method name
    ///
    /// Unregistered names fall back to the NotFound handler.
    #[must_use]
    pub fn call_method(&self, name: &str, ctx: MethodContext) -> Box<dyn MethodHandler> {
        let normalized = normalize_method(name);
        let factory = self
            .factories
            .get(&normalized)
            .copied()
            .unwrap_or(methods::not_found::factory);

        tracing::trace!(method = %normalized, "Dispatching method");
        factory(ctx)
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_parts() -> Parts {
        axum::http::Request::builder()
            .uri("/echo")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_normalize_method() {
        assert_eq!(normalize_method("not_found"), "NotFound");
        assert_eq!(normalize_method("NotFound"), "NotFound");
        assert_eq!(normalize_method("welcome"), "Welcome");
        assert_eq!(normalize_method("xhr_streaming"), "XhrStreaming");
        assert_eq!(normalize_method("xhr"), "Xhr");
    }

    #[test]
    fn test_generic_is_reserved() {
        assert_eq!(normalize_method("generic"), "NotFound");
        assert_eq!(normalize_method("Generic"), "NotFound");
    }

    #[test]
    fn test_equivalent_spellings_dispatch_same_handler() {
        let registry = MethodRegistry::builtin();

        let a = registry.call_method("not_found", MethodContext::unresolved(bare_parts()));
        let b = registry.call_method("NotFound", MethodContext::unresolved(bare_parts()));
        let c = registry.call_method("generic", MethodContext::unresolved(bare_parts()));

        assert_eq!(a.name(), "NotFound");
        assert_eq!(a.name(), b.name());
        assert_eq!(b.name(), c.name());
    }

    #[test]
    fn test_unknown_method_falls_back_to_not_found() {
        let registry = MethodRegistry::builtin();
        let handler = registry.call_method("bogus", MethodContext::unresolved(bare_parts()));
        assert_eq!(handler.name(), "NotFound");
    }

    #[test]
    fn test_builtin_methods_resolve() {
        let registry = MethodRegistry::builtin();
        for (token, expected) in [
            ("welcome", "Welcome"),
            ("info", "Info"),
            ("iframe", "Iframe"),
            ("websocket", "Websocket"),
        ] {
            let handler = registry.call_method(token, MethodContext::unresolved(bare_parts()));
            assert_eq!(handler.name(), expected);
        }
    }
}
