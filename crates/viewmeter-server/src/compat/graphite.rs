//! Graphite-style response counters and per-view timings.

use std::sync::Arc;

use axum::http::StatusCode;
use viewmeter_core::stats::StatsClient;

use super::LegacyMiddleware;
use crate::context::RequestContext;

/// Counts responses by status code: `response.<code>`, plus
/// `response.auth.<code>` for authenticated requests. A request that ends
/// without a response counts as `500`.
#[derive(Debug, Clone)]
pub struct GraphiteMiddleware {
    stats: Arc<dyn StatsClient>,
}

impl GraphiteMiddleware {
    pub fn new(stats: Arc<dyn StatsClient>) -> Self {
        Self { stats }
    }

    fn count(&self, req: &RequestContext, code: u16) {
        self.stats.incr(&format!("response.{code}"));
        if req.principal().is_some() {
            self.stats.incr(&format!("response.auth.{code}"));
        }
    }
}

impl LegacyMiddleware for GraphiteMiddleware {
    fn process_response(&self, req: &RequestContext, status: StatusCode) {
        self.count(req, status.as_u16());
    }

    fn process_exception(&self, req: &RequestContext) {
        self.count(req, StatusCode::INTERNAL_SERVER_ERROR.as_u16());
    }
}

/// Times each request from view resolution to completion and emits
/// `view.<module>.<name>.<METHOD>`, `view.<module>.<METHOD>` and
/// `view.<METHOD>`. Requests that never reached a view are not timed.
#[derive(Debug, Clone)]
pub struct GraphiteRequestTimingMiddleware {
    stats: Arc<dyn StatsClient>,
}

impl GraphiteRequestTimingMiddleware {
    pub fn new(stats: Arc<dyn StatsClient>) -> Self {
        Self { stats }
    }

    fn record(&self, req: &RequestContext) {
        let Some(view) = req.view() else {
            return;
        };
        let elapsed = view.at.elapsed();
        let method = req.method().as_str();
        let module = &view.id.module;

        self.stats
            .timing(&format!("view.{module}.{}.{method}", view.id.name), elapsed);
        self.stats.timing(&format!("view.{module}.{method}"), elapsed);
        self.stats.timing(&format!("view.{method}"), elapsed);
    }
}

impl LegacyMiddleware for GraphiteRequestTimingMiddleware {
    fn process_response(&self, req: &RequestContext, _status: StatusCode) {
        self.record(req);
    }

    fn process_exception(&self, req: &RequestContext) {
        self.record(req);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, Method, Uri};
    use viewmeter_core::stats::{Recorder, Sample};

    use super::*;
    use crate::context::{ViewId, AUTH_USER_HEADER};

    fn ctx(auth: bool) -> RequestContext {
        let mut headers = HeaderMap::new();
        if auth {
            headers.insert(AUTH_USER_HEADER, HeaderValue::from_static("alice"));
        }
        RequestContext::new(Method::GET, Uri::from_static("/inbox"), headers)
    }

    #[test]
    fn counts_status_and_auth_status() {
        let rec = Arc::new(Recorder::new());
        let mw = GraphiteMiddleware::new(rec.clone());

        mw.process_response(&ctx(false), StatusCode::OK);
        mw.process_response(&ctx(true), StatusCode::NOT_FOUND);
        mw.process_exception(&ctx(true));

        assert_eq!(
            rec.samples(),
            vec![
                Sample::Incr("response.200".into()),
                Sample::Incr("response.404".into()),
                Sample::Incr("response.auth.404".into()),
                Sample::Incr("response.500".into()),
                Sample::Incr("response.auth.500".into()),
            ]
        );
    }

    #[test]
    fn timing_emits_three_keys_for_resolved_view() {
        let rec = Arc::new(Recorder::new());
        let mw = GraphiteRequestTimingMiddleware::new(rec.clone());

        let req = ctx(false);
        assert!(req.resolve_view(ViewId::new("workload.views", "inbox")));
        mw.process_response(&req, StatusCode::OK);

        let keys: Vec<String> = rec.samples().iter().map(|s| s.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "view.workload.views.inbox.GET",
                "view.workload.views.GET",
                "view.GET",
            ]
        );
    }

    #[test]
    fn timing_skips_unresolved_requests() {
        let rec = Arc::new(Recorder::new());
        let mw = GraphiteRequestTimingMiddleware::new(rec.clone());

        mw.process_response(&ctx(false), StatusCode::NOT_FOUND);
        mw.process_exception(&ctx(false));

        assert!(rec.samples().is_empty());
    }
}
