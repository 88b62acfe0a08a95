//! Info method
//!
//! Capability probe: reports the resolved route's options plus a random
//! entropy value clients use to seed their PRNG.

use crate::dispatch::{MethodContext, MethodHandler};
use crate::gateway::Gateway;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub struct Info {
    ctx: MethodContext,
}

pub fn factory(ctx: MethodContext) -> Box<dyn MethodHandler> {
    Box::new(Info { ctx })
}

#[async_trait::async_trait]
impl MethodHandler for Info {
    fn name(&self) -> &'static str {
        "Info"
    }

    async fn handle(self: Box<Self>, gateway: &Gateway) -> Response {
        let options = match self.ctx.mount_path.as_deref() {
            Some(mount) => gateway.registry().route_options(mount),
            None => crate::routing::RouteOptions::default(),
        };

        let body = json!({
            "websocket": options.websocket,
            "origins": options.origins,
            "cookie_needed": options.cookie_needed,
            "entropy": rand::random::<u32>(),
        });

        (
            [
                (header::CONTENT_TYPE, "application/json; charset=UTF-8"),
                (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate, max-age=0"),
            ],
            body.to_string(),
        )
            .into_response()
    }
}
