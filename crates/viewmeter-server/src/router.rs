//! Axum router wiring.
//!
//! Every route is wrapped with [`view`] so the usage gauges and view timings
//! are keyed by a name. The whole router is then wrapped by [`instrument`].

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, MethodRouter},
    Router,
};

use crate::app_state::AppState;
use crate::compat;
use crate::context::ViewId;
use crate::middleware::{request_context, resource_usage, view as view_mw};
use crate::{ops, views};

pub fn build_router(state: AppState) -> Router {
    instrument(routes(), state)
}

/// Application routes, not yet instrumented.
pub fn routes() -> Router<AppState> {
    let m = views::MODULE;
    Router::new()
        .route("/", view(ViewId::new(m, "index"), get(views::index)))
        .route("/feed_timeline", view(ViewId::new(m, "feed_timeline"), get(views::feed_timeline)))
        .route("/timeline", view(ViewId::new(m, "timeline"), get(views::timeline)))
        .route("/bundle_tray", view(ViewId::new(m, "bundle_tray"), get(views::bundle_tray)))
        .route("/inbox", view(ViewId::new(m, "inbox"), get(views::inbox)))
        .route("/seen", view(ViewId::new(m, "seen"), get(views::seen)))
        .route("/healthz", view(ViewId::new(ops::MODULE, "healthz"), get(ops::healthz)))
        .route("/metrics", view(ViewId::new(ops::MODULE, "metrics"), get(ops::metrics)))
}

/// Bind `id` into the request context whenever `route` handles a request.
pub fn view(id: ViewId, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.layer(from_fn_with_state(id, view_mw::resolve))
}

/// Wrap `routes` with the request context, usage measurement and compat hooks.
pub fn instrument(routes: Router<AppState>, state: AppState) -> Router {
    let mut app = routes;
    for hooks in state.hooks().iter().rev() {
        app = app.layer(from_fn_with_state(Arc::clone(hooks), compat::drive));
    }
    app.layer(from_fn_with_state(state.meter(), resource_usage::measure))
        .layer(from_fn(request_context::propagate))
        .with_state(state)
}
