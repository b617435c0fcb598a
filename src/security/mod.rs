//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming /api/detect request:
//!     → headers.rs (resolve origin and client identity)
//!     → access_control.rs (origin or IP guard → 403)
//!     → rate_limit.rs (fixed window per identity → 429)
//!     → Pass to the detect handler
//! ```
//!
//! # Design Decisions
//! - Cheap checks first: nothing reaches the provider before both pass
//! - One guard policy at a time, disabled by default
//! - Limiter state sits behind the shared `Store` abstraction

pub mod access_control;
pub mod headers;
pub mod rate_limit;

pub use access_control::{Guard, GuardDecision};
pub use rate_limit::RateLimiter;
