use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

use crate::context::{self, RequestContext};

/// Establish the request context for the rest of the stack.
///
/// The context is also inserted into the request extensions so extractors can
/// reach it without the task-local.
pub async fn propagate(mut req: Request, next: Next) -> Response {
    let ctx = Arc::new(RequestContext::from_request(&req));
    req.extensions_mut().insert(Arc::clone(&ctx));

    let span = tracing::info_span!(
        "request",
        request_id = ctx.id(),
        method = %ctx.method(),
        uri = %ctx.uri(),
    );

    context::scope(ctx, next.run(req)).instrument(span).await
}
