//! Path resolution
//!
//! Pure parse of the protocol URL grammar:
//!
//! ```text
//! <mount>/               -> welcome
//! <mount>/info           -> info
//! <mount>/iframe[-<version>].html
//! <mount>/<serverId>/<sessionId>/<transport>
//! ```
//!
//! The mount path is found by greedy longest-prefix search: the full path
//! is tried first and one trailing segment is popped per failed attempt, so
//! nested mounts (`/a` and `/a/b`) resolve unambiguously to the more
//! specific one.

use super::registry::RouteRegistry;
use sockjs_common::{GatewayError, GatewayResult};
use std::collections::VecDeque;

/// Validation rule for identifier tokens in the URL grammar
///
/// The native upgrade entry requires an all-digit server identifier; the
/// plain HTTP entry accepts any dot-free token. The asymmetry is kept as an
/// explicit policy so each entry point names the rule it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerIdRule {
    /// Decimal digits only, non-empty
    DigitsOnly,
    /// Any non-empty token without a literal dot
    #[default]
    Any,
}

impl ServerIdRule {
    #[must_use]
    pub fn allows(self, id: &str) -> bool {
        match self {
            Self::DigitsOnly => !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()),
            Self::Any => !id.is_empty() && !id.contains('.'),
        }
    }
}

/// Transient resolution result; consumed once by dispatch, never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Mount path of the owning application
    pub mount_path: String,
    /// Method token to dispatch (`welcome`, `info`, `iframe`, or a
    /// transport name)
    pub method: String,
    /// Server identifier, present only on transport paths
    pub server_id: Option<String>,
    /// Session identifier, present only on transport paths
    pub session_id: Option<String>,
    /// Version captured from an `iframe-<version>.html` segment
    pub iframe_version: Option<String>,
}

/// Resolve a raw request path against the registry's mount paths
pub fn resolve(path: &str, registry: &RouteRegistry) -> GatewayResult<ResolvedRoute> {
    let mut segments: Vec<String> = path
        .split('/')
        .map(|s| {
            urlencoding::decode(s).map_or_else(|_| s.to_string(), |decoded| decoded.into_owned())
        })
        .collect();
    let mut extras: VecDeque<String> = VecDeque::new();

    // Longest-prefix-first search; popped segments become extras in their
    // original left-to-right order.
    let mount_path = loop {
        let joined = segments.join("/");
        let candidate = if joined.is_empty() { "/" } else { joined.as_str() };
        if registry.route_exists(candidate) {
            break candidate.to_string();
        }
        match segments.pop() {
            Some(segment) => extras.push_front(segment),
            None => return Err(GatewayError::RouteNotFound),
        }
        if segments.is_empty() {
            return Err(GatewayError::RouteNotFound);
        }
    };

    // Trailing slash normalization: one trailing empty segment is dropped
    if extras.back().is_some_and(String::is_empty) {
        extras.pop_back();
    }

    let Some(token) = extras.pop_back() else {
        // Bare mount path requested
        return Ok(ResolvedRoute {
            mount_path,
            method: "welcome".to_string(),
            server_id: None,
            session_id: None,
            iframe_version: None,
        });
    };

    if token == "info" {
        return Ok(ResolvedRoute {
            mount_path,
            method: "info".to_string(),
            server_id: None,
            session_id: None,
            iframe_version: None,
        });
    }

    if let Some(version) = iframe_version(&token) {
        return Ok(ResolvedRoute {
            mount_path,
            method: "iframe".to_string(),
            server_id: None,
            session_id: None,
            iframe_version: version,
        });
    }

    // Transport path: the token is the method name, preceded by
    // <serverId>/<sessionId>
    if extras.len() < 2 {
        return Err(GatewayError::RouteNotFound);
    }
    let session_id = extras.pop_back().unwrap_or_default();
    let server_id = extras.pop_back().unwrap_or_default();
    if !ServerIdRule::Any.allows(&session_id) || !ServerIdRule::Any.allows(&server_id) {
        return Err(GatewayError::RouteNotFound);
    }

    Ok(ResolvedRoute {
        mount_path,
        method: token,
        server_id: Some(server_id),
        session_id: Some(session_id),
        iframe_version: None,
    })
}

/// Parse an `iframe[-<version>].html` token
///
/// Returns `None` when the token is not an iframe request, `Some(None)` for
/// the unversioned form, and `Some(Some(version))` when a version suffix is
/// present (possibly empty, as in `iframe-.html`).
fn iframe_version(token: &str) -> Option<Option<String>> {
    let rest = token.strip_prefix("iframe")?.strip_suffix(".html")?;
    if rest.is_empty() {
        return Some(None);
    }
    rest.strip_prefix('-').map(|v| Some(v.to_string()))
}
