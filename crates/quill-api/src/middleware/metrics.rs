//! Metrics tracking middleware
//!
//! Tracks request latency, counts, and status codes per endpoint
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

/// Metrics tracking middleware
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let endpoint = normalize_endpoint(request.uri().path());

    let response = next.run(request).await;

    let latency_us = start.elapsed().as_micros() as u64;
    state
        .record_request(endpoint, response.status().as_u16(), latency_us)
        .await;

    response
}

/// Normalize endpoint paths for consistent metrics
///
/// Replaces id segments with `:id` so `/api/posts/post-1` and
/// `/api/posts/admin-post` are counted together.
fn normalize_endpoint(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let normalized: Vec<&str> = segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let parent = if i > 0 { segments[i - 1] } else { "" };
            if is_id_segment(parent, seg) {
                ":id"
            } else {
                seg
            }
        })
        .collect();

    normalized.join("/")
}

/// A segment is an id when it follows a collection name and is not itself
/// a fixed sub-route
fn is_id_segment(parent: &str, segment: &str) -> bool {
    const COLLECTIONS: &[&str] = &["users", "posts", "comments", "tags", "slug"];
    const FIXED: &[&str] = &["slug"];

    !segment.is_empty() && COLLECTIONS.contains(&parent) && !FIXED.contains(&segment)
}
