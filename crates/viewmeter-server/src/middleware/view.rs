use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::context::{self, ViewId};

/// Bind `view` into the current request context, then call the handler.
pub async fn resolve(State(view): State<ViewId>, req: Request, next: Next) -> Response {
    match context::current() {
        Some(ctx) => {
            if !ctx.resolve_view(view.clone()) {
                tracing::debug!(view = %view.name, "view already resolved for request");
            }
        }
        None => tracing::trace!(view = %view.name, "no request context; view not recorded"),
    }
    next.run(req).await
}
