//! Detection provider client with timeout and error mapping.
//!
//! # Responsibilities
//! - Validate text before spending a provider call
//! - POST the trimmed text with the `ApiKey` header
//! - Map HTTP statuses and transport failures to [`DetectionError`]
//! - Hand successful bodies to the wire decoder and normalizer

use std::time::{Duration, Instant};

use reqwest::StatusCode;

use crate::config::ProviderConfig;
use crate::detection::normalize::normalize_result;
use crate::detection::text;
use crate::detection::types::{DetectionError, DetectionResult, NormalizedResult};
use crate::detection::wire::{DecodedDetection, DetectTextRequest, ProviderEnvelope, ValidationErrorBody};
use crate::observability::metrics;

const API_KEY_HEADER: &str = "ApiKey";

/// Client for the upstream detection API. Cheap to clone.
#[derive(Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_chars: usize,
    timeout: Duration,
}

impl DetectionClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Provider endpoint, key and timeout
    /// * `max_chars` - Character ceiling enforced before calling out
    pub fn new(config: &ProviderConfig, max_chars: usize) -> DetectionResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if is_loopback_url(&config.base_url) {
            // A local provider (sidecar, mock) is never reached through HTTP(S)_PROXY
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| DetectionError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.detect_path
            ),
            api_key: config.api_key.clone(),
            max_chars,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Classify `input` through the provider.
    pub async fn detect(&self, input: &str) -> DetectionResult<NormalizedResult> {
        let normalized = text::normalize(input);
        text::validate(&normalized, self.max_chars).map_err(DetectionError::InvalidInput)?;

        let start = Instant::now();
        let outcome = self.call(&normalized.trimmed).await;

        match &outcome {
            Ok(result) => {
                metrics::record_provider_call("success", start);
                tracing::debug!(
                    result_id = %result.result_id,
                    ai_probability = result.ai_probability,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Provider call succeeded"
                );
            }
            Err(e) => {
                metrics::record_provider_call(e.kind(), start);
                tracing::warn!(
                    error = %e,
                    kind = e.kind(),
                    timeout_secs = self.timeout.as_secs(),
                    "Provider call failed"
                );
            }
        }

        outcome
    }

    async fn call(&self, trimmed: &str) -> DetectionResult<NormalizedResult> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&DetectTextRequest {
                input_text: trimmed,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_status(status, &body, self.max_chars));
        }

        let envelope: ProviderEnvelope = serde_json::from_slice(&body).map_err(|e| {
            DetectionError::Provider(format!("Invalid response from detection service: {}", e))
        })?;

        if !envelope.is_success() {
            return Err(DetectionError::Provider(
                envelope.message().unwrap_or("Detection failed").to_string(),
            ));
        }

        let data = envelope.data.unwrap_or_default();
        Ok(normalize_result(DecodedDetection::from(data)))
    }
}

/// Map a non-2xx provider status to an error, reading detail from `body` where useful.
pub fn map_status(status: StatusCode, body: &[u8], max_chars: usize) -> DetectionError {
    match status.as_u16() {
        401 => DetectionError::Unauthorized,
        403 => DetectionError::Forbidden,
        413 => DetectionError::PayloadTooLarge(max_chars),
        422 => {
            let detail = serde_json::from_slice::<ValidationErrorBody>(body)
                .ok()
                .and_then(|b| b.detail.into_iter().next());
            match detail {
                Some(d) => DetectionError::Validation(format!("Validation error: {} ({})", d.msg, d.kind)),
                None => DetectionError::Validation("Invalid request format".to_string()),
            }
        }
        429 => DetectionError::RateLimited,
        500 => DetectionError::Provider(
            body_message(body).unwrap_or_else(|| "Detection service error".to_string()),
        ),
        502 | 503 => DetectionError::Unavailable,
        code => DetectionError::Provider(
            body_message(body).unwrap_or_else(|| format!("Provider error: {}", code)),
        ),
    }
}

fn body_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn is_loopback_url(base_url: &str) -> bool {
    let Ok(url) = url::Url::parse(base_url) else {
        return false;
    };
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

fn map_transport_error(e: reqwest::Error) -> DetectionError {
    if e.is_timeout() {
        DetectionError::Timeout
    } else if e.is_connect() {
        DetectionError::Unreachable
    } else {
        DetectionError::Transport(e.to_string())
    }
}
