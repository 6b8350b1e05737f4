//! Funding feed layer: live client, fallback data and normalization
//!
//! Mirrors the exchange adapter layout: `errors` for the error taxonomy,
//! `traits` for the client seam, `types` for the wire and normalized data.

pub mod errors;
pub mod fallback;
pub mod http;
pub mod normalizer;
pub mod traits;
pub mod types;

pub use errors::{FeedError, FeedResult};
pub use fallback::FallbackStore;
pub use http::{FeedSource, HttpFeedClient, DEFAULT_FETCH_TIMEOUT_MS};
pub use normalizer::Normalizer;
pub use traits::FeedClient;
pub use types::{
    FeedSnapshot, FundingSample, RateUnit, RawFeedPayload, SnapshotOrigin, SymbolSnapshot,
};
