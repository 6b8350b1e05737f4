//! Ranker: open-interest tiers and final ordering.

use serde::{Deserialize, Serialize};

use crate::core::types::{ArbitrageOpportunity, OiTier};

/// Default last rank (inclusive) of the High tier
pub const DEFAULT_HIGH_TIER_MAX_RANK: u32 = 5;

/// Default last rank (inclusive) of the Mid tier
pub const DEFAULT_MID_TIER_MAX_RANK: u32 = 15;

/// Inclusive upper bounds of the High and Mid tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high_max_rank: u32,
    pub mid_max_rank: u32,
}

impl TierThresholds {
    pub fn new(high_max_rank: u32, mid_max_rank: u32) -> Self {
        Self {
            high_max_rank,
            mid_max_rank,
        }
    }

    /// rank ≤ high → High, rank ≤ mid → Mid, otherwise Low
    #[inline]
    pub fn tier_for(&self, rank: u32) -> OiTier {
        if rank <= self.high_max_rank {
            OiTier::High
        } else if rank <= self.mid_max_rank {
            OiTier::Mid
        } else {
            OiTier::Low
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_TIER_MAX_RANK, DEFAULT_MID_TIER_MAX_RANK)
    }
}

/// Attaches tiers and sorts by net spread, highest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    thresholds: TierThresholds,
}

impl Ranker {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    /// Tier every opportunity and sort by `net_spread` descending.
    ///
    /// `sort_by` is stable: equal spreads keep their input order.
    #[must_use]
    pub fn rank(&self, mut opportunities: Vec<ArbitrageOpportunity>) -> Vec<ArbitrageOpportunity> {
        for opportunity in &mut opportunities {
            opportunity.open_interest_tier =
                Some(self.thresholds.tier_for(opportunity.open_interest_rank));
        }
        opportunities.sort_by(|a, b| b.net_spread.cmp(&a.net_spread));
        opportunities
    }
}
