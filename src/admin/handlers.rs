use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub provider_endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSummary {
    pub entries: usize,
    pub ttl_secs: u64,
    pub cleanup_threshold: usize,
    pub rate_limit_enabled: bool,
    pub rate_limit_identities: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeSummary {
    pub cache_entries_removed: usize,
    pub rate_windows_removed: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        provider_endpoint: state.client.endpoint().to_string(),
    })
}

pub async fn get_guard(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.guard.describe())
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    Json(CacheSummary {
        entries: state.cache.len(),
        ttl_secs: state.cache.ttl().as_secs(),
        cleanup_threshold: state.config.cache.cleanup_threshold,
        rate_limit_enabled: state.limiter.is_enabled(),
        rate_limit_identities: state.limiter.tracked(),
    })
}

pub async fn purge_cache(State(state): State<AppState>) -> Json<PurgeSummary> {
    let cache_entries_removed = state.cache.purge_expired();
    let rate_windows_removed = state.limiter.purge_expired_at(Instant::now());
    tracing::info!(cache_entries_removed, rate_windows_removed, "Purged expired state");

    Json(PurgeSummary {
        cache_entries_removed,
        rate_windows_removed,
    })
}
