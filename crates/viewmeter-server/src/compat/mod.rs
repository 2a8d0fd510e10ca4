//! Adapter for old-style request hooks.
//!
//! Hook-based middlewares (`process_request` / `process_response` /
//! `process_exception`) are driven by [`drive`], which plugs them into the axum
//! middleware stack without changing the request or the response.
//!
//! `process_exception` fires only when the inner stack produced no response at
//! all (panic or cancellation). Error responses are ordinary responses.

pub mod graphite;

use std::fmt::Debug;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::context::{self, RequestContext};

pub use graphite::{GraphiteMiddleware, GraphiteRequestTimingMiddleware};

pub trait LegacyMiddleware: Debug + Send + Sync + 'static {
    fn process_request(&self, _req: &RequestContext) {}
    fn process_response(&self, _req: &RequestContext, _status: StatusCode) {}
    fn process_exception(&self, _req: &RequestContext) {}
}

/// Shared hook handle used as middleware state.
pub type Hooks = Arc<dyn LegacyMiddleware>;

/// Run `hooks` around the inner stack.
pub async fn drive(State(hooks): State<Hooks>, req: Request, next: Next) -> Response {
    let ctx = req
        .extensions()
        .get::<Arc<RequestContext>>()
        .cloned()
        .or_else(context::current)
        .unwrap_or_else(|| Arc::new(RequestContext::from_request(&req)));

    hooks.process_request(&ctx);

    let pending = Pending {
        hooks: Arc::clone(&hooks),
        ctx: Arc::clone(&ctx),
        answered: false,
    };
    let response = next.run(req).await;
    pending.answered();

    hooks.process_response(&ctx, response.status());
    response
}

/// Calls `process_exception` if dropped before a response was produced.
struct Pending {
    hooks: Hooks,
    ctx: Arc<RequestContext>,
    answered: bool,
}

impl Pending {
    fn answered(mut self) {
        self.answered = true;
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if !self.answered {
            tracing::warn!(request_id = self.ctx.id(), "request ended without a response");
            self.hooks.process_exception(&self.ctx);
        }
    }
}
