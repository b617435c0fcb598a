//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (client, cache, guard, limiter) from config
//! - Create the Axum Router with handlers and per-route security layers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve until the shutdown broadcast fires

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::{GuardMode, ServiceConfig};
use crate::detection::{DetectionClient, DetectionResult, ResultCache};
use crate::http::detect::detect_handler;
use crate::http::request::{request_id, request_id_header, MakeRequestUuidV4};
use crate::security::access_control::{guard_middleware, Guard};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub client: DetectionClient,
    pub cache: ResultCache,
    pub guard: Arc<Guard>,
    pub limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    /// State with process-local cache and limiter stores.
    pub fn from_config(config: ServiceConfig) -> DetectionResult<Self> {
        let cache = ResultCache::in_memory(&config.cache);
        let limiter = RateLimiter::in_memory(&config.rate_limit, config.guard.trust_proxy_headers);
        Self::with_components(config, cache, limiter)
    }

    /// State around caller-supplied cache and limiter (e.g. external stores).
    pub fn with_components(
        config: ServiceConfig,
        cache: ResultCache,
        limiter: RateLimiter,
    ) -> DetectionResult<Self> {
        let client = DetectionClient::new(&config.provider, config.detection.max_text_chars)?;
        let guard = Guard::from_config(&config.guard);

        Ok(Self {
            config: Arc::new(config),
            client,
            cache,
            guard: Arc::new(guard),
            limiter: Arc::new(limiter),
            started_at: Instant::now(),
        })
    }
}

/// HTTP server for the detection proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> DetectionResult<Self> {
        Ok(Self::with_state(AppState::from_config(config)?))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        // Guard runs first, then the limiter, then the handler
        let detect = post(detect_handler)
            .layer(middleware::from_fn_with_state(
                state.limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.guard.clone(),
                guard_middleware,
            ));

        let mut router = Router::new()
            .route("/api/detect", detect)
            .route("/api/health", get(health));

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuidV4))
    }

    /// The fully layered router, for serving or driving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let config = &self.state.config;
        tracing::info!(
            address = %addr,
            provider = %self.state.client.endpoint(),
            guard = config.guard.mode.as_str(),
            rate_limit = config.rate_limit.enabled,
            "HTTP server starting"
        );
        if config.guard.mode == GuardMode::Disabled {
            tracing::warn!("Origin/IP guard is disabled; all callers are admitted");
        }
        if config.guard.mode == GuardMode::Ip && config.guard.trust_proxy_headers {
            tracing::warn!(
                "IP guard trusts X-Forwarded-For; callers can claim any address unless a front proxy overwrites it"
            );
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
