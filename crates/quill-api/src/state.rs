//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthService, JwtConfig};
use quill_core::{AppConfig, MemoryStore, Store};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Per-endpoint request statistics
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct EndpointMetrics {
    pub requests: u64,
    /// Response counts keyed by status code
    pub status_counts: BTreeMap<u16, u64>,
    pub total_latency_us: u64,
    pub max_latency_us: u64,
}

impl EndpointMetrics {
    fn record(&mut self, status: u16, latency_us: u64) {
        self.requests += 1;
        *self.status_counts.entry(status).or_insert(0) += 1;
        self.total_latency_us += latency_us;
        self.max_latency_us = self.max_latency_us.max(latency_us);
    }

    pub fn avg_latency_us(&self) -> u64 {
        if self.requests == 0 {
            0
        } else {
            self.total_latency_us / self.requests
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Every repository behind one injectable object
    pub store: Arc<dyn Store>,
    /// Authentication gateway over the same store
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Request statistics keyed by normalized endpoint
    pub metrics: RwLock<HashMap<String, EndpointMetrics>>,
}

impl AppState {
    /// Create application state over the given store
    ///
    /// The state starts not ready; the caller flips it once startup work such
    /// as fixture seeding has finished.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let auth = AuthService::new(store.clone(), JwtConfig::from(&config.auth));
        Self {
            config,
            store,
            auth,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(false),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Record one finished request
    pub async fn record_request(&self, endpoint: String, status: u16, latency_us: u64) {
        self.increment_requests();
        self.metrics
            .write()
            .await
            .entry(endpoint)
            .or_default()
            .record(status, latency_us);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default(), Arc::new(MemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_request() {
        let state = AppState::default();
        state.record_request("/api/posts".to_string(), 200, 100).await;
        state.record_request("/api/posts".to_string(), 404, 300).await;

        assert_eq!(state.get_request_count(), 2);
        let metrics = state.metrics.read().await;
        let posts = &metrics["/api/posts"];
        assert_eq!(posts.requests, 2);
        assert_eq!(posts.status_counts[&404], 1);
        assert_eq!(posts.avg_latency_us(), 200);
        assert_eq!(posts.max_latency_us, 300);
    }

    #[test]
    fn test_ready_flag() {
        let state = AppState::default();
        assert!(!state.is_ready());
        state.set_ready(true);
        assert!(state.is_ready());
    }
}
