//! Detection subsystem.
//!
//! # Data Flow
//! ```text
//! submitted text
//!     → text.rs (trim, count, length ceiling)
//!     → fingerprint.rs (SHA-256 of lowercased text)
//!     → cache.rs (TTL lookup)
//!     → on miss: client.rs (POST to provider, status mapping)
//!         → wire.rs (loose provider shapes → DecodedDetection)
//!         → normalize.rs (verdict, confidence, sentence flags)
//!     → cache.rs (store)
//! ```

pub mod cache;
pub mod client;
pub mod fingerprint;
pub mod normalize;
pub mod text;
pub mod types;
pub mod wire;

pub use cache::{CacheEntry, ResultCache};
pub use client::DetectionClient;
pub use fingerprint::fingerprint;
pub use types::{
    Confidence, DetectionError, DetectionResult, NormalizedResult, ParsedSentence, Verdict,
    PROVIDER_TAG,
};
