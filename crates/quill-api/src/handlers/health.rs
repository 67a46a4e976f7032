//! Health check handlers
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub users: u64,
    pub posts: u64,
}

/// Readiness probe
///
/// Reports the store's record counts so an unseeded store is visible.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let users = state.store.count_users().await;
    let posts = state.store.count_posts().await;
    let store_ok = users.is_ok() && posts.is_ok();
    let ready = state.is_ready() && store_ok;

    let response = ReadinessResponse {
        ready,
        users: users.unwrap_or(0),
        posts: posts.unwrap_or(0),
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSummary {
    pub requests: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
}

/// JSON metrics response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub requests_per_second: f64,
    pub endpoints: BTreeMap<String, EndpointSummary>,
}

/// Request counters and uptime
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Request metrics", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let uptime = state.uptime_secs();
    let total_requests = state.get_request_count();
    let rps = if uptime > 0 {
        total_requests as f64 / uptime as f64
    } else {
        0.0
    };

    let endpoints = state
        .metrics
        .read()
        .await
        .iter()
        .map(|(endpoint, m)| {
            let summary = EndpointSummary {
                requests: m.requests,
                status_counts: m.status_counts.clone(),
                avg_latency_us: m.avg_latency_us(),
                max_latency_us: m.max_latency_us,
            };
            (endpoint.clone(), summary)
        })
        .collect();

    Json(MetricsResponse {
        uptime_seconds: uptime,
        total_requests,
        requests_per_second: rps,
        endpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_readiness_waits_for_startup() {
        let state = Arc::new(AppState::default());
        let response = readiness_check(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.set_ready(true);
        let response = readiness_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_summarize_endpoints() {
        let state = Arc::new(AppState::default());
        state.record_request("/api/posts".to_string(), 200, 100).await;
        state.record_request("/api/posts".to_string(), 404, 300).await;

        let Json(response) = metrics(State(state)).await;
        assert_eq!(response.total_requests, 2);

        let posts = &response.endpoints["/api/posts"];
        assert_eq!(posts.requests, 2);
        assert_eq!(posts.avg_latency_us, 200);
        assert_eq!(posts.max_latency_us, 300);
        assert_eq!(posts.status_counts.get(&404), Some(&1));
    }
}
