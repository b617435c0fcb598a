//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the detection proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Upstream detection provider settings.
    pub provider: ProviderConfig,

    /// Input limits for submitted text.
    pub detection: DetectionConfig,

    /// Result cache settings.
    pub cache: CacheConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Origin / IP guard configuration.
    pub guard: GuardConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Worst-case JSON size of one UTF-16 code unit (`\uXXXX`).
const ESCAPED_UNIT_BYTES: usize = 6;

/// Room for the envelope around the text (`{"text": ...}`, whitespace, extra fields).
const BODY_ENVELOPE_BYTES: usize = 4 * 1024;

impl ServiceConfig {
    /// Bytes read from a detect request body.
    ///
    /// Never below what a maximal, fully escaped text needs, so raising
    /// `max_text_chars` alone cannot make valid input unreadable.
    pub fn detect_body_limit(&self) -> usize {
        let text_bytes = self
            .detection
            .max_text_chars
            .saturating_mul(ESCAPED_UNIT_BYTES)
            .saturating_add(BODY_ENVELOPE_BYTES);
        self.listener.max_body_bytes.max(text_bytes)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request body ceiling in bytes. Raised automatically to fit
    /// `detection.max_text_chars`; bodies between the two still get an
    /// exact character count in the length error.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request, in seconds.
    /// Should exceed `provider.timeout_secs` so the provider timeout surfaces first.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 35 }
    }
}

/// Upstream detection provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider API.
    pub base_url: String,

    /// Secret sent in the `ApiKey` header.
    pub api_key: String,

    /// Path of the text detection endpoint.
    pub detect_path: String,

    /// Outbound call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.zerogpt.com".to_string(),
            api_key: String::new(),
            detect_path: "/api/detect/detectText".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Character ceiling for submitted text (after trimming).
    pub max_text_chars: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 50_000,
        }
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,

    /// Entry count above which expired entries are swept on insert.
    pub cleanup_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 86_400,
            cleanup_threshold: 1_000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per identity in one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Tracked identities above which elapsed windows are swept.
    pub cleanup_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window_secs: 60,
            cleanup_threshold: 10_000,
        }
    }
}

/// Which guard policy is enforced. Exactly one can be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    #[default]
    Disabled,
    Origin,
    Ip,
}

impl GuardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardMode::Disabled => "disabled",
            GuardMode::Origin => "origin",
            GuardMode::Ip => "ip",
        }
    }
}

/// Origin / IP guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub mode: GuardMode,

    /// Domains (optionally with port) requests must originate from.
    pub allowed_domains: Vec<String>,

    /// Client IPs admitted in `ip` mode.
    pub allowed_ips: Vec<String>,

    /// Admit requests that carry no Origin, Referer or Host (development).
    pub allow_missing_origin: bool,

    /// Admit loopback clients in `ip` mode.
    pub allow_loopback: bool,

    /// Resolve client identity from X-Forwarded-For and friends.
    ///
    /// Only safe behind a proxy that overwrites those headers. In `ip` mode
    /// with this set, a direct caller can name an allowed address and pass;
    /// turn it off when the service is reachable without such a proxy.
    pub trust_proxy_headers: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mode: GuardMode::Disabled,
            allowed_domains: vec!["localhost:3000".to_string()],
            allowed_ips: Vec::new(),
            allow_missing_origin: false,
            allow_loopback: true,
            trust_proxy_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the `/admin` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.detection.max_text_chars, 50_000);
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.cache.cleanup_threshold, 1_000);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.guard.mode, GuardMode::Disabled);
    }

    #[test]
    fn test_body_limit_follows_text_limit() {
        let mut config = ServiceConfig::default();
        assert_eq!(config.detect_body_limit(), 1024 * 1024);

        config.detection.max_text_chars = 400_000;
        assert_eq!(config.detect_body_limit(), 400_000 * 6 + 4 * 1024);

        config.listener.max_body_bytes = 8 * 1024 * 1024;
        assert_eq!(config.detect_body_limit(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [guard]
            mode = "origin"
            allowed_domains = ["example.com"]

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.guard.mode, GuardMode::Origin);
        assert_eq!(config.guard.allowed_domains, vec!["example.com"]);
        assert_eq!(config.cache.ttl_secs, 60);
        // Untouched sections keep their defaults
        assert_eq!(config.cache.cleanup_threshold, 1_000);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }
}
