//! Origin / IP guard.
//! Keeps the provider key from being spent by callers outside the site.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{GuardConfig, GuardMode};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::headers::{request_identity, request_origin};

pub const ORIGIN_DENIED: &str = "Access denied. Requests must originate from authorized domain. Please visit the website to use this service.";
pub const IP_DENIED: &str = "Access denied. Your IP address is not authorized to use this service.";

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny(&'static str),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Admission policy evaluated before any other work.
#[derive(Debug, Clone)]
pub struct Guard {
    mode: GuardMode,
    allowed_domains: Vec<String>,
    allowed_ips: Vec<IpAddr>,
    allow_missing_origin: bool,
    allow_loopback: bool,
    trust_proxy_headers: bool,
}

impl Guard {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            mode: config.mode,
            allowed_domains: config
                .allowed_domains
                .iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            allowed_ips: config
                .allowed_ips
                .iter()
                .filter_map(|ip| ip.trim().parse().ok())
                .collect(),
            allow_missing_origin: config.allow_missing_origin,
            allow_loopback: config.allow_loopback,
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Decide whether a request may proceed. Never fails.
    pub fn check(&self, headers: &HeaderMap, client_ip: &str) -> GuardDecision {
        let decision = match self.mode {
            GuardMode::Disabled => GuardDecision::Allow,
            GuardMode::Origin => self.check_origin(request_origin(headers).as_deref()),
            GuardMode::Ip => self.check_ip(client_ip),
        };
        metrics::record_guard_decision(self.mode.as_str(), decision.is_allowed());
        decision
    }

    fn check_origin(&self, origin: Option<&str>) -> GuardDecision {
        let Some(origin) = origin else {
            if self.allow_missing_origin {
                tracing::debug!("Request has no origin, admitted by allow_missing_origin");
                return GuardDecision::Allow;
            }
            tracing::warn!("Blocked request with no origin/referer/host header");
            return GuardDecision::Deny(ORIGIN_DENIED);
        };

        if self.origin_allowed(origin) {
            tracing::debug!(origin = %origin, "Allowed request origin");
            GuardDecision::Allow
        } else {
            tracing::warn!(
                origin = %origin,
                allowed = %self.allowed_domains.join(", "),
                "Blocked request from unauthorized origin"
            );
            GuardDecision::Deny(ORIGIN_DENIED)
        }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        let (host, authority) = split_origin(origin);
        self.allowed_domains.iter().any(|allowed| {
            let suffix = format!(".{}", allowed);
            authority == *allowed
                || host == *allowed
                || authority.ends_with(&suffix)
                || host.ends_with(&suffix)
        })
    }

    fn check_ip(&self, client_ip: &str) -> GuardDecision {
        let Ok(ip) = client_ip.parse::<IpAddr>() else {
            tracing::warn!(client_ip = %client_ip, "Blocked request with unresolvable client IP");
            return GuardDecision::Deny(IP_DENIED);
        };

        if (self.allow_loopback && ip.is_loopback()) || self.allowed_ips.contains(&ip) {
            tracing::debug!(client_ip = %ip, "Allowed client IP");
            GuardDecision::Allow
        } else {
            tracing::warn!(client_ip = %ip, "Blocked request from unlisted IP");
            GuardDecision::Deny(IP_DENIED)
        }
    }

    /// Snapshot for the admin API.
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "enabled": self.mode != GuardMode::Disabled,
            "mode": self.mode.as_str(),
            "allowedDomains": self.allowed_domains,
            "allowedIps": self.allowed_ips.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "allowMissingOrigin": self.allow_missing_origin,
            "allowLoopback": self.allow_loopback,
            "trustProxyHeaders": self.trust_proxy_headers,
        })
    }
}

/// Lowercased `(host, host[:port])` of an origin that may or may not carry a scheme.
fn split_origin(origin: &str) -> (String, String) {
    let origin = origin.trim().to_ascii_lowercase();
    if origin.contains("://") {
        if let Ok(url) = url::Url::parse(&origin) {
            if let Some(host) = url.host_str() {
                let authority = match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                return (host.to_string(), authority);
            }
        }
    }
    let host = origin.rsplit_once(':').map_or(origin.as_str(), |(h, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            origin.as_str()
        }
    });
    (host.to_string(), origin.clone())
}

/// Middleware enforcing the guard. Runs before rate limiting.
pub async fn guard_middleware(
    State(guard): State<Arc<Guard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = request_identity(&request, guard.trust_proxy_headers);
    match guard.check(request.headers(), &client_ip) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Deny(reason) => ApiError::Forbidden(reason.to_string()).into_response(),
    }
}
