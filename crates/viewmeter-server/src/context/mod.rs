//! Request context propagation.
//!
//! The active [`RequestContext`] lives in tokio task-local storage for the
//! duration of [`scope`]. Code running inside the request task (metrics
//! teardown, compatibility hooks, handlers) reads it with [`current`]. Each
//! task has its own slot: concurrent requests never observe each other, and
//! the slot is cleared however the scoped future ends.

pub mod request;

use std::future::Future;
use std::sync::Arc;

use viewmeter_core::usage::ViewLookup;

pub use request::{RequestContext, ResolvedView, ViewId, AUTH_USER_HEADER};

tokio::task_local! {
    static CURRENT: Arc<RequestContext>;
}

/// Run `fut` with `ctx` as the current request context.
pub async fn scope<F: Future>(ctx: Arc<RequestContext>, fut: F) -> F::Output {
    CURRENT.scope(ctx, fut).await
}

/// Synchronous variant of [`scope`].
pub fn sync_scope<R>(ctx: Arc<RequestContext>, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(ctx, f)
}

/// The context of the request being handled on this task, if any.
pub fn current() -> Option<Arc<RequestContext>> {
    CURRENT.try_with(Arc::clone).ok()
}

/// Name of the view handling the current request, once routing has bound it.
pub fn view_name() -> Option<String> {
    current().and_then(|ctx| ctx.view().map(|v| v.id.name.clone()))
}

/// [`view_name`], or `fallback` when there is no context or no resolved view.
pub fn view_name_or(fallback: &str) -> String {
    view_name().unwrap_or_else(|| fallback.to_string())
}

/// [`ViewLookup`] backed by the task-local context.
#[derive(Debug, Clone)]
pub struct TaskLocalViews {
    fallback: String,
}

impl TaskLocalViews {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl ViewLookup for TaskLocalViews {
    fn view_name(&self) -> String {
        view_name_or(&self.fallback)
    }
}
