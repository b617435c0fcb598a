//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{GuardMode, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key} ('{value}'): {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process
/// environment overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Unset variables leave the existing value untouched.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("ZEROGPT_BASE_URL") {
        config.provider.base_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = lookup("ZEROGPT_API_KEY") {
        config.provider.api_key = v;
    }
    if let Some(v) = parsed(&lookup, "MAX_TEXT_CHARS")? {
        config.detection.max_text_chars = v;
    }
    if let Some(v) = parsed(&lookup, "CACHE_TTL_SECONDS")? {
        config.cache.ttl_secs = v;
    }
    if let Some(v) = parsed(&lookup, "RATE_LIMIT_DETECT")? {
        config.rate_limit.max_requests = v;
    }
    if let Some(v) = parsed(&lookup, "RATE_LIMIT_WINDOW_SECS")? {
        config.rate_limit.window_secs = v;
    }
    if let Some(v) = lookup("ALLOWED_DOMAINS") {
        config.guard.allowed_domains = split_list(&v);
    }
    if let Some(v) = lookup("ALLOWED_IPS") {
        config.guard.allowed_ips = split_list(&v);
    }
    if let Some(v) = flag(&lookup, "ALLOW_MISSING_ORIGIN")? {
        config.guard.allow_missing_origin = v;
    }
    if let Some(v) = flag(&lookup, "TRUST_PROXY_HEADERS")? {
        config.guard.trust_proxy_headers = v;
    }

    let origin = flag(&lookup, "DOMAIN_VALIDATION_ENABLED")?;
    let ip = flag(&lookup, "IP_VALIDATION_ENABLED")?;
    match (origin, ip) {
        (Some(true), Some(true)) => {
            return Err(ConfigError::Env {
                key: "IP_VALIDATION_ENABLED",
                value: "true".to_string(),
                reason: "only one guard policy may be active; DOMAIN_VALIDATION_ENABLED is also set"
                    .to_string(),
            });
        }
        (Some(true), _) => config.guard.mode = GuardMode::Origin,
        (_, Some(true)) => config.guard.mode = GuardMode::Ip,
        (Some(false), _) | (_, Some(false)) => config.guard.mode = GuardMode::Disabled,
        (None, None) => {}
    }

    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = v;
    }
    if let Some(v) = lookup("ADMIN_API_KEY") {
        config.admin.api_key = v;
    }

    Ok(())
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Env {
                key,
                reason: e.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

fn flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" | "" => Ok(Some(false)),
            _ => Err(ConfigError::Env {
                key,
                value,
                reason: "expected true or false".to_string(),
            }),
        },
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
