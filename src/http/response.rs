//! Response envelopes and error-to-status mapping.
//!
//! # Responsibilities
//! - Shape successful detections as `{ success, source, data, metadata }`
//! - Shape every failure as `{ success: false, error }`
//! - Map error classes to 400 / 403 / 429 / 500
//!
//! # Design Decisions
//! - Provider status codes are never forwarded; upstream failures become 500
//! - Only locally detected input problems are 400

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::{DetectionError, NormalizedResult};

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    Provider,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Cache => "cache",
            ResultSource::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub chars: usize,
    pub words: usize,
    /// Wall time of a fresh provider call, e.g. "842ms".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectSuccess {
    pub success: bool,
    pub source: ResultSource,
    pub data: NormalizedResult,
    pub metadata: ResponseMetadata,
}

impl DetectSuccess {
    pub fn new(source: ResultSource, data: NormalizedResult, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            source,
            data,
            metadata,
        }
    }
}

impl IntoResponse for DetectSuccess {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Every way a detect request can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Forbidden(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Detection(#[from] DetectionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Detection(DetectionError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Detection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
