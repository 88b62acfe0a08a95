//! NotFound method
//!
//! Answers every path the URL grammar rejects and every unresolved method
//! name. Also the dispatch target for the reserved `generic` base name.

use crate::dispatch::{MethodContext, MethodHandler};
use crate::gateway::Gateway;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub struct NotFound {
    #[allow(dead_code)]
    ctx: MethodContext,
}

pub fn factory(ctx: MethodContext) -> Box<dyn MethodHandler> {
    Box::new(NotFound { ctx })
}

#[async_trait::async_trait]
impl MethodHandler for NotFound {
    fn name(&self) -> &'static str {
        "NotFound"
    }

    async fn handle(self: Box<Self>, _gateway: &Gateway) -> Response {
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            "Not found\n",
        )
            .into_response()
    }
}
