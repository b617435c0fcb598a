//! AI-content detection proxy.
//!
//! Accepts text over HTTP, guards and rate-limits callers, serves repeated
//! submissions from a fingerprint-keyed cache, and forwards the rest to an
//! external detection provider whose response is normalized into a stable
//! result shape.

pub mod admin;
pub mod config;
pub mod detection;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
