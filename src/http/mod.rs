//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → security (guard, rate limit) on /api/detect
//!     → detect.rs (validate, cache, provider)
//!     → response.rs (success / error envelopes)
//!     → Send to client
//! ```

pub mod detect;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{ApiError, DetectSuccess, ResultSource};
pub use server::{AppState, HttpServer};
