use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderMap, Method, Uri};

/// Header set by a trusted auth proxy in front of the app.
pub const AUTH_USER_HEADER: &str = "x-authenticated-user";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a view: the module it lives in and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewId {
    pub module: String,
    pub name: String,
}

impl ViewId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

/// A view bound to a request, with the instant routing selected it.
#[derive(Debug, Clone)]
pub struct ResolvedView {
    pub id: ViewId,
    pub at: Instant,
}

/// Snapshot of the inbound request held in task-local storage while it is handled.
#[derive(Debug)]
pub struct RequestContext {
    id: u64,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    started: Instant,
    view: OnceLock<ResolvedView>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            method,
            uri,
            headers,
            started: Instant::now(),
            view: OnceLock::new(),
        }
    }

    pub fn from_request(req: &Request) -> Self {
        Self::new(req.method().clone(), req.uri().clone(), req.headers().clone())
    }

    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn method(&self) -> &Method {
        &self.method
    }
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Authenticated principal forwarded by the auth proxy, if any.
    pub fn principal(&self) -> Option<&str> {
        self.headers
            .get(AUTH_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    }

    /// Bind the view that handles this request. First write wins; returns
    /// whether this call bound it.
    pub fn resolve_view(&self, id: ViewId) -> bool {
        self.view
            .set(ResolvedView {
                id,
                at: Instant::now(),
            })
            .is_ok()
    }

    pub fn view(&self) -> Option<&ResolvedView> {
        self.view.get()
    }
}
