#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{HeaderMap, Method, Uri};
use viewmeter_core::usage::ViewLookup;
use viewmeter_server::context::{self, RequestContext, TaskLocalViews, ViewId};

fn ctx(path: &'static str) -> Arc<RequestContext> {
    Arc::new(RequestContext::new(Method::GET, Uri::from_static(path), HeaderMap::new()))
}

#[tokio::test]
async fn scope_exposes_exact_context_then_clears() {
    let req = ctx("/feed_timeline");
    assert!(context::current().is_none());

    let out = context::scope(Arc::clone(&req), async {
        let seen = context::current().expect("context inside scope");
        assert!(Arc::ptr_eq(&seen, &req));
        42
    })
    .await;

    assert_eq!(out, 42);
    assert!(context::current().is_none());
}

#[tokio::test]
async fn error_passes_through_and_context_is_released() {
    #[derive(Debug, PartialEq)]
    struct ValueError(String);

    let out: Result<(), ValueError> =
        context::scope(ctx("/inbox"), async { Err(ValueError("x".into())) }).await;

    assert_eq!(out, Err(ValueError("x".into())));
    assert!(context::current().is_none());
}

#[tokio::test]
async fn nested_scope_shadows_then_restores() {
    let outer = ctx("/feed_timeline");
    let inner = ctx("/inbox");

    context::scope(Arc::clone(&outer), async {
        context::scope(Arc::clone(&inner), async {
            let seen = context::current().expect("inner context");
            assert!(Arc::ptr_eq(&seen, &inner));
        })
        .await;

        let seen = context::current().expect("outer context restored");
        assert!(Arc::ptr_eq(&seen, &outer));
    })
    .await;

    assert!(context::current().is_none());
}

#[test]
fn nested_sync_scope_restores_after_panic() {
    let outer = ctx("/timeline");
    context::sync_scope(Arc::clone(&outer), || {
        let res = catch_unwind(AssertUnwindSafe(|| {
            context::sync_scope(ctx("/seen"), || panic!("inner view failed"))
        }));
        assert!(res.is_err());

        let seen = context::current().expect("outer context restored");
        assert!(Arc::ptr_eq(&seen, &outer));
    });
    assert!(context::current().is_none());
}

#[test]
fn panic_releases_context() {
    let res = catch_unwind(AssertUnwindSafe(|| {
        context::sync_scope(ctx("/seen"), || {
            assert!(context::current().is_some());
            panic!("view failed");
        })
    }));

    assert!(res.is_err());
    assert!(context::current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_isolated() {
    let mut tasks = Vec::new();
    for _ in 0..32 {
        tasks.push(tokio::spawn(async {
            let mine = ctx("/timeline");
            context::scope(Arc::clone(&mine), async move {
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    let seen = context::current().expect("context");
                    assert!(Arc::ptr_eq(&seen, &mine));
                }
            })
            .await;
            assert!(context::current().is_none());
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }
}

#[tokio::test]
async fn view_name_falls_back_until_resolved() {
    let views = TaskLocalViews::new("unknown");
    assert_eq!(views.view_name(), "unknown");
    assert_eq!(context::view_name(), None);

    let req = ctx("/bundle_tray");
    context::scope(Arc::clone(&req), async {
        assert_eq!(views.view_name(), "unknown");

        assert!(req.resolve_view(ViewId::new("workload.views", "bundle_tray")));
        assert!(!req.resolve_view(ViewId::new("workload.views", "other")));

        assert_eq!(context::view_name().as_deref(), Some("bundle_tray"));
        assert_eq!(views.view_name(), "bundle_tray");
    })
    .await;

    assert_eq!(context::view_name_or("unknown"), "unknown");
}

#[test]
fn request_ids_are_unique() {
    let a = ctx("/");
    let b = ctx("/");
    assert_ne!(a.id(), b.id());
}
