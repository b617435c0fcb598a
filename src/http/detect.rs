//! `POST /api/detect`.
//!
//! # States
//! ```text
//! Received → Guarded → RateChecked            (middleware, 403 / 429)
//!     → Validated                              (400)
//!     → CacheChecked → CacheHit → Responded
//!                    → CacheMiss → ProviderCalled → CacheStored → Responded   (500 on failure)
//! ```

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::detection::{fingerprint, text};
use crate::http::request::request_id;
use crate::http::response::{ApiError, DetectSuccess, ResponseMetadata, ResultSource};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Inbound body. `text` stays loose so a non-string reads as missing.
#[derive(Debug, Deserialize)]
pub struct DetectionRequest {
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

pub async fn detect_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());

    match process(&state, request, start).await {
        Ok(success) => {
            metrics::record_request(200, success.source.as_str(), start);
            tracing::info!(
                request_id = %request_id,
                source = success.source.as_str(),
                verdict = ?success.data.verdict,
                chars = success.metadata.chars,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Detection served"
            );
            success.into_response()
        }
        Err(e) => {
            let status = e.status();
            metrics::record_request(status.as_u16(), "none", start);
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, error = %e, "Detection failed");
            } else {
                tracing::info!(request_id = %request_id, status = %status, error = %e, "Detection rejected");
            }
            e.into_response()
        }
    }
}

async fn process(
    state: &AppState,
    request: Request<Body>,
    start: Instant,
) -> Result<DetectSuccess, ApiError> {
    let max_chars = state.config.detection.max_text_chars;
    let limit = state.config.detect_body_limit();

    // Past the limit the text cannot be counted, only reported as too long
    let body = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, limit, "Request body rejected");
            ApiError::BadRequest(text::too_long_message(max_chars, None))
        })?;

    let payload: DetectionRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON body".to_string()))?;

    let raw_text = payload
        .text
        .as_ref()
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let normalized = text::normalize(raw_text);
    text::validate(&normalized, max_chars)
        .map_err(ApiError::BadRequest)?;

    let metadata = |latency: Option<String>| ResponseMetadata {
        chars: normalized.char_count,
        words: normalized.word_count,
        latency,
    };

    let key = fingerprint(&normalized.trimmed);

    if let Some(cached) = state.cache.get(&key) {
        tracing::debug!(fingerprint = &key[..12], "Cache hit");
        return Ok(DetectSuccess::new(ResultSource::Cache, cached, metadata(None)));
    }

    tracing::debug!(fingerprint = &key[..12], "Cache miss, calling provider");
    let result = state.client.detect(&normalized.trimmed).await?;
    let latency = format!("{}ms", start.elapsed().as_millis());

    state.cache.set(key, result.clone());

    Ok(DetectSuccess::new(
        ResultSource::Provider,
        result,
        metadata(Some(latency)),
    ))
}
