//! Welcome method
//!
//! Served when the bare mount path is requested.

use crate::dispatch::{MethodContext, MethodHandler};
use crate::gateway::Gateway;
use axum::http::header;
use axum::response::{IntoResponse, Response};

pub struct Welcome {
    #[allow(dead_code)]
    ctx: MethodContext,
}

pub fn factory(ctx: MethodContext) -> Box<dyn MethodHandler> {
    Box::new(Welcome { ctx })
}

#[async_trait::async_trait]
impl MethodHandler for Welcome {
    fn name(&self) -> &'static str {
        "Welcome"
    }

    async fn handle(self: Box<Self>, _gateway: &Gateway) -> Response {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            "Welcome to SockJS!\n",
        )
            .into_response()
    }
}
