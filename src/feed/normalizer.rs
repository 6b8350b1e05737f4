//! Normalizer: raw provider payload to canonical `FeedSnapshot`.
//!
//! Rates are converted to decimal fractions (0.0001 = 0.01%) and grouped by
//! symbol in feed order. A symbol with a structurally invalid entry (exchange
//! map not an object, a rate that is not a number) is dropped on its own; the
//! rest of the payload is still used.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::feed::types::{
    FeedSnapshot, FundingSample, RateUnit, RawFeedPayload, SnapshotOrigin, SymbolSnapshot,
};

/// Converts provider payloads into `FeedSnapshot`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    unit: RateUnit,
}

impl Normalizer {
    pub fn new(unit: RateUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> RateUnit {
        self.unit
    }

    /// Normalize a live payload, stamped with the current time.
    pub fn normalize(&self, raw: &RawFeedPayload) -> FeedSnapshot {
        self.normalize_at(raw, Utc::now(), SnapshotOrigin::Live)
    }

    /// Normalize with an explicit timestamp and origin.
    ///
    /// Pure: the same inputs always give the same snapshot.
    pub fn normalize_at(
        &self,
        raw: &RawFeedPayload,
        fetched_at: DateTime<Utc>,
        origin: SnapshotOrigin,
    ) -> FeedSnapshot {
        let mut symbols = Vec::with_capacity(raw.funding_rates.len());
        let mut dropped = 0usize;

        for (symbol, rates) in &raw.funding_rates {
            match self.symbol_samples(symbol, rates) {
                Some(samples) => symbols.push(SymbolSnapshot {
                    symbol: symbol.clone(),
                    samples,
                    open_interest_rank: raw.oi_rankings.get(symbol).and_then(parse_rank),
                }),
                None => dropped += 1,
            }
        }

        let rank_only = raw
            .oi_rankings
            .keys()
            .filter(|s| !raw.funding_rates.contains_key(s.as_str()))
            .count();

        if dropped > 0 || rank_only > 0 {
            debug!(
                origin = %origin,
                dropped_invalid = dropped,
                dropped_rank_only = rank_only,
                kept = symbols.len(),
                "Normalizer dropped symbols"
            );
        }

        FeedSnapshot {
            symbols,
            fetched_at,
            origin,
        }
    }

    /// Parse one symbol's exchange → rate object; `None` drops the symbol.
    fn symbol_samples(&self, symbol: &str, rates: &Value) -> Option<Vec<FundingSample>> {
        let Some(rates) = rates.as_object() else {
            debug!(symbol = symbol, "Exchange rates entry is not an object, dropping symbol");
            return None;
        };

        let mut samples = Vec::with_capacity(rates.len());
        for (exchange, value) in rates {
            let Some(raw_rate) = parse_decimal(value) else {
                debug!(
                    symbol = symbol,
                    exchange = %exchange,
                    value = %value,
                    "Non-numeric funding rate, dropping symbol"
                );
                return None;
            };
            samples.push(FundingSample::new(exchange.clone(), self.unit.to_fraction(raw_rate)));
        }
        Some(samples)
    }
}

/// JSON number → `Decimal` without going through binary floating point
fn parse_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// JSON number → OI rank; anything that is not a positive integer is "missing"
///
/// Ranks start at 1, so 0 counts as unranked like any other invalid value.
fn parse_rank(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .and_then(|r| u32::try_from(r).ok())
        .filter(|r| *r >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(body: &str) -> RawFeedPayload {
        RawFeedPayload::from_json(body).unwrap()
    }

    #[test]
    fn test_basis_points_converted_to_fraction() {
        let raw = payload(r#"{"funding_rates":{"BTC":{"binance":-1,"bybit":5,"okx":3}},"oi_rankings":{"BTC":1}}"#);
        let snapshot = Normalizer::default().normalize(&raw);

        let btc = snapshot.get("BTC").unwrap();
        assert_eq!(btc.open_interest_rank, Some(1));
        assert_eq!(
            btc.samples,
            vec![
                FundingSample::new("binance", dec!(-0.0001)),
                FundingSample::new("bybit", dec!(0.0005)),
                FundingSample::new("okx", dec!(0.0003)),
            ]
        );
        assert_eq!(snapshot.origin, SnapshotOrigin::Live);
    }

    #[test]
    fn test_fractional_and_scientific_values_are_exact() {
        let raw = payload(r#"{"funding_rates":{"ETH":{"a":0.0005,"b":1e-4}},"oi_rankings":{}}"#);
        let snapshot = Normalizer::new(RateUnit::Fraction).normalize(&raw);
        let eth = snapshot.get("ETH").unwrap();
        assert_eq!(eth.samples[0].rate, dec!(0.0005));
        assert_eq!(eth.samples[1].rate, dec!(0.0001));
    }

    #[test]
    fn test_symbol_without_rank_is_kept_unranked() {
        let raw = payload(r#"{"funding_rates":{"WIF":{"binance":10,"bybit":30}},"oi_rankings":{}}"#);
        let snapshot = Normalizer::default().normalize(&raw);
        assert_eq!(snapshot.get("WIF").unwrap().open_interest_rank, None);
    }

    #[test]
    fn test_rank_only_symbol_is_dropped() {
        let raw = payload(r#"{"funding_rates":{"BTC":{"binance":1,"bybit":2}},"oi_rankings":{"BTC":1,"ETH":2}}"#);
        let snapshot = Normalizer::default().normalize(&raw);
        assert_eq!(snapshot.symbol_count(), 1);
        assert!(snapshot.get("ETH").is_none());
    }

    #[test]
    fn test_non_numeric_rate_drops_only_that_symbol() {
        let raw = payload(
            r#"{"funding_rates":{
                "BTC":{"binance":-1,"bybit":"n/a"},
                "ETH":{"binance":2,"bybit":8}
            },"oi_rankings":{"BTC":1,"ETH":2}}"#,
        );
        let snapshot = Normalizer::default().normalize(&raw);
        assert!(snapshot.get("BTC").is_none());
        assert_eq!(snapshot.get("ETH").unwrap().samples.len(), 2);
    }

    #[test]
    fn test_non_object_rates_drops_symbol() {
        let raw = payload(r#"{"funding_rates":{"BTC":[1,2],"SOL":{"okx":8}},"oi_rankings":{}}"#);
        let snapshot = Normalizer::default().normalize(&raw);
        assert!(snapshot.get("BTC").is_none());
        assert!(snapshot.get("SOL").is_some());
    }

    #[test]
    fn test_invalid_rank_treated_as_missing() {
        let raw = payload(
            r#"{"funding_rates":{"A":{"x":1},"B":{"x":1},"C":{"x":1}},
                "oi_rankings":{"A":"first","B":-3,"C":2.5}}"#,
        );
        let snapshot = Normalizer::default().normalize(&raw);
        for symbol in ["A", "B", "C"] {
            assert_eq!(snapshot.get(symbol).unwrap().open_interest_rank, None, "{}", symbol);
        }
    }

    #[test]
    fn test_zero_rank_treated_as_missing() {
        let raw = payload(
            r#"{"funding_rates":{"DOGE":{"x":1,"y":4},"BTC":{"x":1,"y":2}},
                "oi_rankings":{"DOGE":0,"BTC":1}}"#,
        );
        let snapshot = Normalizer::default().normalize(&raw);
        assert_eq!(snapshot.get("DOGE").unwrap().open_interest_rank, None);
        assert_eq!(snapshot.get("BTC").unwrap().open_interest_rank, Some(1));
    }

    #[test]
    fn test_symbol_order_follows_feed() {
        let raw = payload(r#"{"funding_rates":{"SOL":{"x":1},"BTC":{"x":1},"ETH":{"x":1}},"oi_rankings":{}}"#);
        let snapshot = Normalizer::default().normalize(&raw);
        let order: Vec<&str> = snapshot.symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["SOL", "BTC", "ETH"]);
    }

    #[test]
    fn test_normalize_at_is_deterministic() {
        let raw = payload(r#"{"funding_rates":{"BTC":{"binance":-1,"bybit":5}},"oi_rankings":{"BTC":1}}"#);
        let at = Utc::now();
        let normalizer = Normalizer::default();
        let a = normalizer.normalize_at(&raw, at, SnapshotOrigin::Fallback);
        let b = normalizer.normalize_at(&raw, at, SnapshotOrigin::Fallback);
        assert_eq!(a, b);
    }
}
