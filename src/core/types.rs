//! Core data types for the funding arbitrage pipeline.
//!
//! `ArbitrageOpportunity` is the unit consumers read; `ScanResult` is the
//! whole value the scheduler publishes each cycle.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::feed::types::SnapshotOrigin;

/// Rank assumed for symbols missing from the OI ranking table.
///
/// Large enough to land in the lowest tier with any sane thresholds.
pub const UNRANKED_OI_RANK: u32 = 99;

/// Funding settlements per day on an 8-hour cycle
pub const DEFAULT_PAYMENTS_PER_DAY: u32 = 3;

/// Days used to annualize a per-day return
pub const DAYS_PER_YEAR: u32 = 365;

// =============================================================================
// Open-interest tier
// =============================================================================

/// Tradability bucket derived from the open-interest rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OiTier {
    High,
    Mid,
    Low,
}

impl fmt::Display for OiTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OiTier::High => write!(f, "High"),
            OiTier::Mid => write!(f, "Mid"),
            OiTier::Low => write!(f, "Low"),
        }
    }
}

// =============================================================================
// Arbitrage Opportunity
// =============================================================================

/// Best long/short exchange pair for one symbol.
///
/// Invariants (enforced by `SpreadEngine`):
/// - `long_exchange != short_exchange`
/// - `long_rate <= short_rate`, so `net_spread >= 0`
/// - `annualized_return == net_spread * payments_per_day * 365`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub symbol: String,
    /// Exchange with the lowest rate (open the long here)
    pub long_exchange: String,
    /// Exchange with the highest rate (open the short here)
    pub short_exchange: String,
    pub long_rate: Decimal,
    pub short_rate: Decimal,
    /// `short_rate - long_rate`, per funding period
    pub net_spread: Decimal,
    pub annualized_return: Decimal,
    pub daily_profit: Decimal,
    pub open_interest_rank: u32,
    /// Filled in by the ranker; `None` only on unranked engine output
    pub open_interest_tier: Option<OiTier>,
    pub observed_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Net spread as a percentage (0.0006 → 0.06), saturating at `Decimal::MAX`
    pub fn net_spread_pct(&self) -> Decimal {
        self.net_spread.saturating_mul(Decimal::ONE_HUNDRED)
    }

    /// Annualized return as a percentage (0.657 → 65.7), saturating at `Decimal::MAX`
    pub fn annualized_pct(&self) -> Decimal {
        self.annualized_return.saturating_mul(Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Scheduler state & published result
// =============================================================================

/// Lifecycle state of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerState {
    /// Not running (initial and terminal state)
    Idle,
    /// A feed fetch is outstanding
    Fetching,
    /// Last cycle published live data
    Ready,
    /// Last cycle published fallback data
    Degraded,
}

impl fmt::Display for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerState::Idle => write!(f, "idle"),
            ScannerState::Fetching => write!(f, "fetching"),
            ScannerState::Ready => write!(f, "ready"),
            ScannerState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Point-in-time result published by the scheduler.
///
/// Replaced whole on every cycle, never mutated after publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Sorted by `net_spread` descending
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Completion time of the cycle that produced this result
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// True when the data comes from the fallback store
    pub is_degraded: bool,
    /// Why the live feed was not used, when degraded
    pub degraded_reason: Option<String>,
    pub origin: Option<SnapshotOrigin>,
    /// Sequence number of the fetch that produced this result (0 = none yet)
    pub sequence: u64,
}

impl ScanResult {
    /// Placeholder published before the first cycle completes
    pub fn empty() -> Self {
        Self {
            opportunities: Vec::new(),
            last_fetched_at: None,
            is_degraded: false,
            degraded_reason: None,
            origin: None,
            sequence: 0,
        }
    }

    /// True until the first cycle has been published
    pub fn is_loading(&self) -> bool {
        self.last_fetched_at.is_none()
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&ArbitrageOpportunity> {
        self.opportunities.iter().find(|o| o.symbol == symbol)
    }

    /// Opportunities whose net spread, in percent, is at least `min_pct`.
    ///
    /// Keeps the ranked order.
    pub fn filter_min_spread_pct(&self, min_pct: Decimal) -> Vec<&ArbitrageOpportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.net_spread_pct() >= min_pct)
            .collect()
    }

}

impl Default for ScanResult {
    fn default() -> Self {
        Self::empty()
    }
}
