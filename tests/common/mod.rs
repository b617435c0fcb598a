//! Shared utilities for integration tests: a programmable mock provider and
//! helpers for driving the service router in-process.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use detection_proxy::config::ServiceConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-key";

/// A running mock provider.
pub struct MockProvider {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    last_request: Arc<Mutex<Option<(Option<String>, Value)>>>,
}

impl MockProvider {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(ApiKey header, JSON body)` of the most recent call.
    pub fn last_request(&self) -> Option<(Option<String>, Value)> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a provider that answers every detect call with `respond(body)`.
pub async fn start_provider<F>(respond: F) -> MockProvider
where
    F: Fn(&Value) -> (u16, Value) + Send + Sync + 'static,
{
    start_provider_with_delay(Duration::ZERO, respond).await
}

/// Like [`start_provider`], sleeping `delay` before answering.
pub async fn start_provider_with_delay<F>(delay: Duration, respond: F) -> MockProvider
where
    F: Fn(&Value) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let last_request = Arc::new(Mutex::new(None));
    let respond = Arc::new(respond);

    let handler = {
        let calls = calls.clone();
        let last_request = last_request.clone();
        move |headers: HeaderMap, Json(body): Json<Value>| {
            let calls = calls.clone();
            let last_request = last_request.clone();
            let respond = respond.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let api_key = headers
                    .get("ApiKey")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let (status, reply) = respond.as_ref()(&body);
                *last_request.lock().unwrap() = Some((api_key, body));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (StatusCode::from_u16(status).unwrap(), Json(reply))
            }
        }
    };

    let app = Router::new().route("/api/detect/detectText", post(handler));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockProvider {
        addr,
        calls,
        last_request,
    }
}

/// A successful provider envelope with string-typed numbers.
pub fn provider_success(fake_percentage: &str, ai_words: &str, text_words: &str) -> Value {
    json!({
        "code": 200,
        "success": true,
        "message": "Success",
        "data": {
            "input_text": "",
            "originalParagraph": "",
            "textWords": text_words,
            "aiWords": ai_words,
            "fakePercentage": fake_percentage,
            "sentences": "[]",
            "h": "[]",
            "collection_id": "",
            "fileName": "",
            "id": "result-1",
            "feedback": ""
        }
    })
}

/// Service config pointed at `provider`.
pub fn test_config(provider: &MockProvider) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.provider.base_url = provider.base_url();
    config.provider.api_key = TEST_API_KEY.to_string();
    config.provider.timeout_secs = 5;
    config
}

/// POST `body` to `/api/detect` through `router`, returning status, headers and JSON body.
pub async fn post_detect(
    router: &Router,
    body: Body,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/detect")
        .header("content-type", "application/json");
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    send(router, builder.body(body).unwrap()).await
}

pub async fn detect_text(router: &Router, text: &str) -> (StatusCode, Value) {
    let (status, _, body) =
        post_detect(router, Body::from(json!({ "text": text }).to_string()), &[]).await;
    (status, body)
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}
