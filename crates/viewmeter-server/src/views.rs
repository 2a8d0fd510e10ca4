//! Demo workload views.
//!
//! Small JSON endpoints with a bit of allocation and hashing so the usage
//! gauges have something to measure. Data is synthetic and deterministic.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;

pub const MODULE: &str = "workload.views";

const MAX_PAGE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub user: Option<String>,
}

fn default_limit() -> usize {
    20
}

impl PageQuery {
    fn checked_limit(&self) -> Result<usize, ApiError> {
        if (1..=MAX_PAGE).contains(&self.limit) {
            Ok(self.limit)
        } else {
            Err(ApiError::bad_request(format!("limit must be between 1 and {MAX_PAGE}")))
        }
    }

    fn required_user(&self) -> Result<&str, ApiError> {
        self.user
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::bad_request("user is required"))
    }
}

#[derive(Debug, Serialize)]
struct Entry {
    id: u64,
    kind: &'static str,
    owner: String,
    score: u32,
}

fn entries(kind: &'static str, seed: &str, n: usize) -> Vec<Entry> {
    (0..n as u64)
        .map(|i| {
            let mut h = DefaultHasher::new();
            (kind, seed, i).hash(&mut h);
            let v = h.finish();
            Entry {
                id: v >> 16,
                kind,
                owner: format!("user{}", v % 1000),
                score: (v % 10_000) as u32,
            }
        })
        .collect()
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "viewmeter",
        "views": ["feed_timeline", "timeline", "bundle_tray", "inbox", "seen"],
    }))
}

pub async fn feed_timeline(Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    let limit = q.checked_limit()?;
    let mut items = entries("feed", q.user.as_deref().unwrap_or("anon"), limit);
    items.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(Json(json!({ "num_results": items.len(), "items": items })))
}

pub async fn timeline(Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    let limit = q.checked_limit()?;
    let items = entries("timeline", q.user.as_deref().unwrap_or("anon"), limit);
    Ok(Json(json!({ "num_results": items.len(), "items": items })))
}

pub async fn bundle_tray(Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    let limit = q.checked_limit()?;
    let bundles: Vec<Value> = entries("bundle", "tray", limit)
        .into_iter()
        .map(|e| json!({ "owner": e.owner, "items": entries("bundle_item", &e.owner, 3) }))
        .collect();
    Ok(Json(json!({ "num_results": bundles.len(), "bundles": bundles })))
}

pub async fn inbox(Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    let user = q.required_user()?;
    let limit = q.checked_limit()?;
    let items = entries("inbox", user, limit);
    Ok(Json(json!({ "user": user, "unread": items.len(), "items": items })))
}

pub async fn seen(Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    let user = q.required_user()?;
    Ok(Json(json!({ "user": user, "seen": true })))
}
