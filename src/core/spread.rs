//! Spread engine for funding-rate arbitrage
//!
//! For every symbol, picks the exchange with the lowest funding rate as the
//! long leg and the one with the highest rate as the short leg, then derives
//! net spread, daily profit and annualized return.
//!
//! # Tie-break
//! Running min/max use strict `<` / `>`, so when several exchanges share the
//! extreme rate the first one in feed order wins. Test fixtures depend on it.
//!
//! # Purity
//! No I/O and no shared state; the engine can be called repeatedly or from
//! several tasks on independent snapshots.

use rust_decimal::Decimal;
use tracing::trace;

use crate::core::types::{
    ArbitrageOpportunity, DAYS_PER_YEAR, DEFAULT_PAYMENTS_PER_DAY, UNRANKED_OI_RANK,
};
use crate::feed::types::{FeedSnapshot, FundingSample, SymbolSnapshot};

/// Why a symbol produced no opportunity. Filtering only, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two exchange samples
    InsufficientData { samples: usize },
    /// Every exchange reports the same rate; no distinct pair exists
    NoDistinctLegs,
    /// Spread or derived returns exceed the `Decimal` range
    Overflow,
}

/// Computes `ArbitrageOpportunity`s from a `FeedSnapshot`.
#[derive(Debug, Clone, Copy)]
pub struct SpreadEngine {
    payments_per_day: u32,
}

impl SpreadEngine {
    /// Engine with an explicit number of funding payments per day
    pub fn new(payments_per_day: u32) -> Self {
        Self { payments_per_day }
    }

    pub fn payments_per_day(&self) -> u32 {
        self.payments_per_day
    }

    /// One opportunity per eligible symbol, in snapshot order (not ranked).
    #[must_use]
    pub fn compute_opportunities(&self, snapshot: &FeedSnapshot) -> Vec<ArbitrageOpportunity> {
        snapshot
            .symbols
            .iter()
            .filter_map(|symbol| match self.evaluate(symbol, snapshot) {
                Ok(opportunity) => Some(opportunity),
                Err(reason) => {
                    trace!(symbol = %symbol.symbol, reason = ?reason, "Symbol skipped");
                    None
                }
            })
            .collect()
    }

    /// Evaluate a single symbol
    pub fn evaluate(
        &self,
        symbol: &SymbolSnapshot,
        snapshot: &FeedSnapshot,
    ) -> Result<ArbitrageOpportunity, SkipReason> {
        if symbol.samples.len() < 2 {
            return Err(SkipReason::InsufficientData {
                samples: symbol.samples.len(),
            });
        }

        let (long, short) = select_legs(&symbol.samples);
        if long.exchange == short.exchange {
            return Err(SkipReason::NoDistinctLegs);
        }

        let net_spread = short
            .rate
            .checked_sub(long.rate)
            .ok_or(SkipReason::Overflow)?;
        let daily_profit = net_spread
            .checked_mul(Decimal::from(self.payments_per_day))
            .ok_or(SkipReason::Overflow)?;
        let annualized_return = daily_profit
            .checked_mul(Decimal::from(DAYS_PER_YEAR))
            .ok_or(SkipReason::Overflow)?;

        Ok(ArbitrageOpportunity {
            symbol: symbol.symbol.clone(),
            long_exchange: long.exchange.clone(),
            short_exchange: short.exchange.clone(),
            long_rate: long.rate,
            short_rate: short.rate,
            net_spread,
            annualized_return,
            daily_profit,
            open_interest_rank: symbol.open_interest_rank.unwrap_or(UNRANKED_OI_RANK),
            open_interest_tier: None,
            observed_at: snapshot.fetched_at,
        })
    }
}

impl Default for SpreadEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENTS_PER_DAY)
    }
}

/// Single pass over the samples: (min-rate sample, max-rate sample).
///
/// Caller guarantees at least one sample.
#[inline]
fn select_legs(samples: &[FundingSample]) -> (&FundingSample, &FundingSample) {
    let mut long = &samples[0];
    let mut short = &samples[0];
    for sample in &samples[1..] {
        if sample.rate < long.rate {
            long = sample;
        }
        if sample.rate > short.rate {
            short = sample;
        }
    }
    (long, short)
}

// =============================================================================
// Tests
// =============================================================================
