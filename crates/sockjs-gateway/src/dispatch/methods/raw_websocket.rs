//! Plain-HTTP handler for the `websocket` transport name
//!
//! Genuine upgrades never reach the dispatcher; they are claimed earlier by
//! the transport binder. A request that names the websocket transport but
//! arrives as plain HTTP gets the protocol's standard rejections.

use crate::dispatch::{MethodContext, MethodHandler};
use crate::gateway::Gateway;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};

pub struct RawWebSocket {
    ctx: MethodContext,
}

pub fn factory(ctx: MethodContext) -> Box<dyn MethodHandler> {
    Box::new(RawWebSocket { ctx })
}

#[async_trait::async_trait]
impl MethodHandler for RawWebSocket {
    fn name(&self) -> &'static str {
        "Websocket"
    }

    async fn handle(self: Box<Self>, _gateway: &Gateway) -> Response {
        if self.ctx.parts.method != Method::GET {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET")],
            )
                .into_response();
        }

        (
            StatusCode::BAD_REQUEST,
            "Can \"Upgrade\" only to \"WebSocket\".",
        )
            .into_response()
    }
}
