//! Data types exchanged between the feed layer and the spread pipeline.
//!
//! `RawFeedPayload` is the wire document as served by the funding API.
//! `FeedSnapshot` is its normalized, immutable form: samples are in
//! canonical decimal fractions and keep the order in which the feed listed
//! them, since that order decides tie-breaks downstream.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::feed::errors::{FeedError, FeedResult};

// =============================================================================
// Raw payload
// =============================================================================

/// Funding document as returned by the upstream API.
///
/// ```json
/// {
///   "funding_rates": { "BTC": { "binance": -1, "bybit": 5 } },
///   "oi_rankings":   { "BTC": 1 }
/// }
/// ```
///
/// Inner values are kept as raw JSON so one bad symbol can be dropped by the
/// normalizer without failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawFeedPayload {
    /// symbol → (exchange → rate in provider units)
    pub funding_rates: Map<String, Value>,
    /// symbol → open-interest rank (1 = most open interest)
    pub oi_rankings: Map<String, Value>,
}

impl RawFeedPayload {
    /// Parse a payload from JSON text.
    ///
    /// Missing `funding_rates` / `oi_rankings`, or either of them not being
    /// an object, is a `MalformedPayload`.
    pub fn from_json(body: &str) -> FeedResult<Self> {
        serde_json::from_str(body).map_err(|e| FeedError::MalformedPayload(e.to_string()))
    }
}

// =============================================================================
// Rate units
// =============================================================================

/// Encoding used by a provider for funding rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    /// 1 = 0.01% (the funding API's native unit)
    #[default]
    BasisPoints,
    /// 1 = 1%
    Percent,
    /// Already a decimal fraction (0.0001 = 0.01%)
    Fraction,
}

impl RateUnit {
    /// Convert a provider value into a decimal fraction
    pub fn to_fraction(self, value: Decimal) -> Decimal {
        match self {
            RateUnit::BasisPoints => value / Decimal::from(10_000),
            RateUnit::Percent => value / Decimal::ONE_HUNDRED,
            RateUnit::Fraction => value,
        }
    }
}

// =============================================================================
// Normalized snapshot
// =============================================================================

/// One exchange's funding rate for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSample {
    /// Exchange identifier as listed by the feed (e.g. "binance")
    pub exchange: String,
    /// Rate as a decimal fraction per funding period
    pub rate: Decimal,
}

impl FundingSample {
    pub fn new(exchange: impl Into<String>, rate: Decimal) -> Self {
        Self {
            exchange: exchange.into(),
            rate,
        }
    }
}

/// All samples for one symbol, in feed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub samples: Vec<FundingSample>,
    /// `None` when the symbol has no entry in the OI ranking table
    pub open_interest_rank: Option<u32>,
}

impl SymbolSnapshot {
    /// Number of distinct exchanges quoting this symbol
    pub fn exchange_count(&self) -> usize {
        self.samples.len()
    }
}

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Live,
    Fallback,
}

impl fmt::Display for SnapshotOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotOrigin::Live => write!(f, "live"),
            SnapshotOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// Normalized feed snapshot: ordered symbol → `SymbolSnapshot` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Symbols in feed order; symbol names are unique
    pub symbols: Vec<SymbolSnapshot>,
    pub fetched_at: DateTime<Utc>,
    pub origin: SnapshotOrigin,
}

impl FeedSnapshot {
    /// Look up a symbol
    pub fn get(&self, symbol: &str) -> Option<&SymbolSnapshot> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_live(&self) -> bool {
        self.origin == SnapshotOrigin::Live
    }

    /// Same data, relabelled with another origin
    pub fn with_origin(mut self, origin: SnapshotOrigin) -> Self {
        self.origin = origin;
        self
    }
}
