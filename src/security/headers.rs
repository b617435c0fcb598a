//! Caller identity and origin extraction from request headers.
//!
//! # Design Decisions
//! - Forwarded headers are only honored when `trust_proxy_headers` is set
//! - First X-Forwarded-For entry is the original client
//! - Unresolvable callers share the `"unknown"` identity

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
};

/// Shared identity for callers that cannot be resolved.
pub const UNKNOWN_IDENTITY: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Where the request claims to come from: Origin, then Referer reduced to
/// `scheme://host[:port]`, then Host.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = header_str(headers, "origin") {
        return Some(origin.to_string());
    }

    if let Some(referer) = header_str(headers, "referer") {
        return Some(match url::Url::parse(referer) {
            Ok(url) if url.has_host() => url.origin().ascii_serialization(),
            _ => referer.to_string(),
        });
    }

    header_str(headers, "host").map(str::to_string)
}

/// Resolve the caller's IP as a string.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(first) = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        {
            return first.to_string();
        }
        if let Some(ip) = header_str(headers, "x-real-ip") {
            return ip.to_string();
        }
        if let Some(ip) = header_str(headers, "cf-connecting-ip") {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}

/// [`client_ip`] for a full request, using the connection's peer address when present.
pub fn request_identity(request: &Request<Body>, trust_proxy_headers: bool) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer, trust_proxy_headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_origin_preferred() {
        let h = headers(&[
            ("origin", "https://example.com"),
            ("referer", "https://other.com/page"),
            ("host", "internal:3000"),
        ]);
        assert_eq!(request_origin(&h).as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_referer_reduced_to_origin() {
        let h = headers(&[("referer", "https://example.com:8443/tools/detect?x=1")]);
        assert_eq!(request_origin(&h).as_deref(), Some("https://example.com:8443"));
    }

    #[test]
    fn test_host_fallback_and_none() {
        let h = headers(&[("host", "localhost:3000")]);
        assert_eq!(request_origin(&h).as_deref(), Some("localhost:3000"));
        assert_eq!(request_origin(&HeaderMap::new()), None);
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip(&h, None, true), "203.0.113.7");
    }

    #[test]
    fn test_header_priority() {
        let h = headers(&[("x-real-ip", "198.51.100.4"), ("cf-connecting-ip", "192.0.2.1")]);
        assert_eq!(client_ip(&h, None, true), "198.51.100.4");

        let h = headers(&[("cf-connecting-ip", "192.0.2.1")]);
        assert_eq!(client_ip(&h, None, true), "192.0.2.1");
    }

    #[test]
    fn test_untrusted_headers_use_peer() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7")]);
        let peer: SocketAddr = "192.0.2.50:41000".parse().unwrap();
        assert_eq!(client_ip(&h, Some(peer), false), "192.0.2.50");
        assert_eq!(client_ip(&h, None, false), UNKNOWN_IDENTITY);
    }
}
