//! Detection result types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag identifying the upstream classifier in every result.
pub const PROVIDER_TAG: &str = "zerogpt";

/// Coarse classification derived from the AI probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AI")]
    Ai,
    Human,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One sentence extracted by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSentence {
    pub text: String,
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,
    pub index: usize,
}

/// Text as the provider saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawText {
    pub original_text: String,
    pub preprocessed_text: String,
}

/// Provider response normalized into strict types. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub verdict: Verdict,
    /// 0–100, rounded to one decimal.
    pub ai_probability: f64,
    pub confidence: Confidence,
    pub feedback: String,

    pub total_words: u64,
    pub ai_words: u64,
    /// Always `total_words - ai_words`.
    pub human_words: u64,

    pub sentences: Vec<ParsedSentence>,
    pub highlighted_sentences: Vec<String>,

    pub result_id: String,
    pub checked_at: DateTime<Utc>,
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawText>,
}

/// Errors surfaced by the detection pipeline. `Display` is user-facing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Submitted text failed local validation.
    #[error("{0}")]
    InvalidInput(String),

    #[error("API authentication failed. Please check your API key.")]
    Unauthorized,

    #[error("Access forbidden. Ensure your server IP is whitelisted.")]
    Forbidden,

    #[error("Content too large. Maximum {} characters allowed.", limit_label(.0))]
    PayloadTooLarge(usize),

    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Detection service temporarily unavailable. Please try again.")]
    Unavailable,

    #[error("Request timeout. The detection took too long.")]
    Timeout,

    #[error("Cannot reach detection service. Please check your connection.")]
    Unreachable,

    /// Provider answered but reported failure; carries its message.
    #[error("{0}")]
    Provider(String),

    #[error("An unexpected error occurred during detection: {0}")]
    Transport(String),
}

impl DetectionError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionError::InvalidInput(_) => "invalid_input",
            DetectionError::Unauthorized => "unauthorized",
            DetectionError::Forbidden => "forbidden",
            DetectionError::PayloadTooLarge(_) => "payload_too_large",
            DetectionError::Validation(_) => "validation",
            DetectionError::RateLimited => "rate_limited",
            DetectionError::Unavailable => "unavailable",
            DetectionError::Timeout => "timeout",
            DetectionError::Unreachable => "unreachable",
            DetectionError::Provider(_) => "provider",
            DetectionError::Transport(_) => "transport",
        }
    }
}

fn limit_label(limit: &usize) -> String {
    crate::detection::text::group_thousands(*limit)
}

pub type DetectionResult<T> = Result<T, DetectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serde_names() {
        assert_eq!(serde_json::to_string(&Verdict::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&Verdict::Human).unwrap(), "\"Human\"");
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"Low\"");
    }

    #[test]
    fn test_sentence_field_names() {
        let sentence = ParsedSentence {
            text: "Hi.".into(),
            is_ai_generated: true,
            index: 0,
        };
        let json = serde_json::to_value(&sentence).unwrap();
        assert_eq!(json["isAIGenerated"], true);
        assert_eq!(json["index"], 0);
    }

    #[test]
    fn test_error_display() {
        let err = DetectionError::PayloadTooLarge(50_000);
        assert_eq!(err.to_string(), "Content too large. Maximum 50,000 characters allowed.");

        let err = DetectionError::Provider("Quota exhausted".into());
        assert_eq!(err.to_string(), "Quota exhausted");
        assert_eq!(err.kind(), "provider");
    }
}
