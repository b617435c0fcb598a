//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits and windows > 0, addresses parse)
//! - Check that the active guard policy has something to match against
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::{GuardMode, ServiceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.provider.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "provider.api_key",
            "is required (set ZEROGPT_API_KEY)",
        ));
    }

    if let Err(e) = url::Url::parse(&config.provider.base_url) {
        errors.push(ValidationError::new(
            "provider.base_url",
            format!("'{}' is not a valid URL: {}", config.provider.base_url, e),
        ));
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ValidationError::new("provider.timeout_secs", "must be > 0"));
    }

    if config.detection.max_text_chars == 0 {
        errors.push(ValidationError::new("detection.max_text_chars", "must be > 0"));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be > 0"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be > 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be > 0"));
        }
    }

    match config.guard.mode {
        GuardMode::Origin if config.guard.allowed_domains.is_empty() => {
            errors.push(ValidationError::new(
                "guard.allowed_domains",
                "origin guard is enabled but no domains are allowed",
            ));
        }
        GuardMode::Ip => {
            if config.guard.allowed_ips.is_empty() && !config.guard.allow_loopback {
                errors.push(ValidationError::new(
                    "guard.allowed_ips",
                    "ip guard is enabled but no addresses are allowed",
                ));
            }
            for ip in &config.guard.allowed_ips {
                if ip.parse::<IpAddr>().is_err() {
                    errors.push(ValidationError::new(
                        "guard.allowed_ips",
                        format!("'{}' is not an IP address", ip),
                    ));
                }
            }
        }
        _ => {}
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "admin endpoints are enabled without a key",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.provider.api_key = "secret".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let config = ServiceConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "provider.api_key");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.detection.max_text_chars = 0;
        config.cache.ttl_secs = 0;
        config.provider.base_url = "not a url".into();
        config.guard.mode = GuardMode::Ip;
        config.guard.allowed_ips = vec!["10.0.0.300".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"detection.max_text_chars"));
        assert!(fields.contains(&"cache.ttl_secs"));
        assert!(fields.contains(&"provider.base_url"));
        assert!(fields.contains(&"guard.allowed_ips"));
    }

    #[test]
    fn test_origin_guard_needs_domains() {
        let mut config = valid_config();
        config.guard.mode = GuardMode::Origin;
        config.guard.allowed_domains.clear();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "guard.allowed_domains");
    }

    #[test]
    fn test_rate_limit_zero_ignored_when_disabled() {
        let mut config = valid_config();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }
}
