//! Iframe bootstrap method
//!
//! Serves the hidden-iframe HTML page that older browsers load for
//! cross-domain transports. The page is immutable for a given client
//! version, so it carries a strong ETag and long-lived cache headers.

use crate::dispatch::{MethodContext, MethodHandler};
use crate::gateway::Gateway;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::hash::{Hash, Hasher};

const DEFAULT_CLIENT_URL: &str = "https://cdn.jsdelivr.net/sockjs/1/sockjs.min.js";

pub struct Iframe {
    ctx: MethodContext,
    version: Option<String>,
}

pub fn factory(ctx: MethodContext) -> Box<dyn MethodHandler> {
    Box::new(Iframe { ctx, version: None })
}

impl Iframe {
    fn client_url(&self) -> String {
        match &self.version {
            Some(version) => format!("https://cdn.jsdelivr.net/sockjs/{version}/sockjs.min.js"),
            None => DEFAULT_CLIENT_URL.to_string(),
        }
    }

    fn body(&self) -> String {
        format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             \x20 <meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\" />\n\
             \x20 <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\n\
             \x20 <script src=\"{}\"></script>\n\
             \x20 <script>\n\
             \x20   document.domain = document.domain;\n\
             \x20   SockJS.bootstrap_iframe();\n\
             \x20 </script>\n\
             </head>\n\
             <body>\n\
             \x20 <h2>Don't panic!</h2>\n\
             \x20 <p>This is a SockJS hidden iframe. It's used for cross domain magic.</p>\n\
             </body>\n\
             </html>\n",
            self.client_url()
        )
    }
}

fn etag_for(body: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    body.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

#[async_trait::async_trait]
impl MethodHandler for Iframe {
    fn name(&self) -> &'static str {
        "Iframe"
    }

    fn attach_version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    async fn handle(self: Box<Self>, _gateway: &Gateway) -> Response {
        let body = self.body();
        let etag = etag_for(&body);

        let not_modified = self
            .ctx
            .parts
            .headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == etag);

        if not_modified {
            return StatusCode::NOT_MODIFIED.into_response();
        }

        (
            [
                (header::CONTENT_TYPE, "text/html; charset=UTF-8".to_string()),
                (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
                (header::ETAG, etag),
            ],
            body,
        )
            .into_response()
    }
}
