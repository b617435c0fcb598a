//! Per-identity rate limiting with a fixed-window counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::headers::request_identity;
use crate::store::{MemoryStore, Store};

const DEFAULT_CLEANUP_THRESHOLD: usize = 10_000;

/// Counter state for one identity.
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
}

/// Fixed-window limiter: `max_requests` per identity per window.
///
/// Windows reset lazily on the next request after they expire. Elapsed
/// windows are swept once the identity count passes `cleanup_threshold`,
/// and again each time it doubles from what the last sweep left.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn Store<RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
    enabled: bool,
    trust_proxy_headers: bool,
    cleanup_threshold: usize,
    next_sweep_at: Arc<AtomicUsize>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn Store<RateLimitEntry>>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
            enabled: true,
            trust_proxy_headers: true,
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            next_sweep_at: Arc::new(AtomicUsize::new(DEFAULT_CLEANUP_THRESHOLD)),
        }
    }

    pub fn with_cleanup_threshold(mut self, threshold: usize) -> Self {
        self.cleanup_threshold = threshold;
        self.next_sweep_at = Arc::new(AtomicUsize::new(threshold));
        self
    }

    /// Process-local limiter built from configuration.
    pub fn in_memory(config: &RateLimitConfig, trust_proxy_headers: bool) -> Self {
        Self {
            enabled: config.enabled,
            trust_proxy_headers,
            ..Self::new(
                Arc::new(MemoryStore::new()),
                config.max_requests,
                Duration::from_secs(config.window_secs),
            )
            .with_cleanup_threshold(config.cleanup_threshold)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub fn check(&self, identity: &str) -> bool {
        self.check_at(identity, Instant::now())
    }

    pub fn check_at(&self, identity: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        let mut allowed = false;
        self.store.update(identity, &mut |current| match current {
            Some(entry) if now <= entry.window_reset_at => {
                if entry.count >= self.max_requests {
                    allowed = false;
                    entry.clone()
                } else {
                    allowed = true;
                    RateLimitEntry {
                        count: entry.count + 1,
                        window_reset_at: entry.window_reset_at,
                    }
                }
            }
            // First request, or the window has elapsed
            _ => {
                allowed = true;
                RateLimitEntry {
                    count: 1,
                    window_reset_at: now + self.window,
                }
            }
        });
        self.maybe_sweep(now);
        allowed
    }

    fn maybe_sweep(&self, now: Instant) {
        let tracked = self.store.len();
        if tracked <= self.next_sweep_at.load(Ordering::Relaxed) {
            return;
        }
        let removed = self.purge_expired_at(now);
        let remaining = self.store.len();
        self.next_sweep_at.store(
            self.cleanup_threshold.max(remaining.saturating_mul(2)),
            Ordering::Relaxed,
        );
        tracing::debug!(removed, remaining, "Swept elapsed rate-limit windows");
    }

    /// Drop identities whose window has elapsed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        self.store.retain(&mut |entry| now <= entry.window_reset_at)
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.store.len()
    }
}

/// Middleware applying the limiter to the caller's identity.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = request_identity(&request, limiter.trust_proxy_headers);

    if limiter.check(&identity) {
        next.run(request).await
    } else {
        tracing::warn!(client = %identity, limit = limiter.max_requests, "Rate limit exceeded");
        metrics::record_rate_limited();
        ApiError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryStore::new()),
            max,
            Duration::from_secs(window_secs),
        )
    }

    #[test]
    fn test_exactly_limit_requests_pass() {
        let limiter = limiter(10, 60);
        let start = Instant::now();
        for i in 0..10 {
            assert!(limiter.check_at("1.2.3.4", start + Duration::from_millis(i)), "request {i}");
        }
        assert!(!limiter.check_at("1.2.3.4", start + Duration::from_secs(1)));
        assert!(!limiter.check_at("1.2.3.4", start + Duration::from_secs(60)));
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start));

        let after = start + Duration::from_secs(60) + Duration::from_millis(1);
        assert!(limiter.check_at("a", after));
        assert!(limiter.check_at("a", after));
        assert!(!limiter.check_at("a", after));
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn test_disabled_allows_all() {
        let config = RateLimitConfig {
            enabled: false,
            max_requests: 1,
            window_secs: 60,
            cleanup_threshold: 100,
        };
        let limiter = RateLimiter::in_memory(&config, true);
        for _ in 0..5 {
            assert!(limiter.check("x"));
        }
        assert_eq!(limiter.tracked(), 0);
    }

    #[test]
    fn test_rotating_identities_stay_bounded() {
        let limiter = limiter(5, 60).with_cleanup_threshold(50);
        let start = Instant::now();
        for i in 0..200 {
            limiter.check_at(&format!("10.0.0.{i}"), start);
        }
        assert_eq!(limiter.tracked(), 200);

        // Every earlier window has elapsed; only the new identities survive
        let later = start + Duration::from_secs(3600);
        for i in 0..200 {
            assert!(limiter.check_at(&format!("10.1.0.{i}"), later));
        }
        assert_eq!(limiter.tracked(), 200);
    }

    #[test]
    fn test_live_windows_survive_sweep() {
        let limiter = limiter(1, 60).with_cleanup_threshold(2);
        let now = Instant::now();
        assert!(limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
        assert!(limiter.check_at("c", now));
        assert_eq!(limiter.tracked(), 3);
        assert!(!limiter.check_at("a", now));
    }

    #[test]
    fn test_purge_expired() {
        let limiter = limiter(5, 10);
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("new", start + Duration::from_secs(8));

        let removed = limiter.purge_expired_at(start + Duration::from_secs(11));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked(), 1);
    }
}
