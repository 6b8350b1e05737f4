//! Configuration types for the scanner
//!
//! Loaded from YAML; every field has a default so an empty document (or no
//! file at all) yields a runnable configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::constants;
use crate::core::ranker::{DEFAULT_HIGH_TIER_MAX_RANK, DEFAULT_MID_TIER_MAX_RANK};
use crate::core::scheduler::DEFAULT_RETRY_BACKOFF_MS;
use crate::core::types::DEFAULT_PAYMENTS_PER_DAY;
use crate::error::AppError;
use crate::feed::types::RateUnit;

// ============================================================================
// Serde defaults
// ============================================================================

fn default_payments_per_day() -> u32 {
    DEFAULT_PAYMENTS_PER_DAY
}

fn default_high_tier_max_rank() -> u32 {
    DEFAULT_HIGH_TIER_MAX_RANK
}

fn default_mid_tier_max_rank() -> u32 {
    DEFAULT_MID_TIER_MAX_RANK
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

fn default_top_n() -> usize {
    10
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Feed, computation and scheduling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Delay between scheduled fetches
    #[serde(default = "constants::refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Funding settlements per day (3 = every 8h)
    #[serde(default = "default_payments_per_day")]
    pub payments_per_day: u32,
    /// URL of the aggregated funding document
    #[serde(default = "constants::feed_endpoint")]
    pub feed_endpoint: String,
    /// Last OI rank (inclusive) of the High tier
    #[serde(default = "default_high_tier_max_rank")]
    pub high_tier_max_rank: u32,
    /// Last OI rank (inclusive) of the Mid tier
    #[serde(default = "default_mid_tier_max_rank")]
    pub mid_tier_max_rank: u32,
    #[serde(default = "constants::fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Unit the feed reports rates in
    #[serde(default)]
    pub rate_unit: RateUnit,
    /// Extra attempts within one cycle before serving fallback data
    #[serde(default)]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: constants::refresh_interval_ms(),
            payments_per_day: default_payments_per_day(),
            feed_endpoint: constants::feed_endpoint(),
            high_tier_max_rank: default_high_tier_max_rank(),
            mid_tier_max_rank: default_mid_tier_max_rank(),
            fetch_timeout_ms: constants::fetch_timeout_ms(),
            rate_unit: RateUnit::default(),
            retry_attempts: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ScannerConfig {
    /// Validate scanner configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: interval must be positive
        if self.refresh_interval_ms == 0 {
            return Err(AppError::Config(
                "refresh_interval_ms must be > 0".to_string(),
            ));
        }

        // Rule: at least one and at most hourly settlements
        if !(1..=24).contains(&self.payments_per_day) {
            return Err(AppError::Config(format!(
                "payments_per_day must be 1-24, got {}",
                self.payments_per_day
            )));
        }

        // Rule: tiers must not overlap
        if self.high_tier_max_rank >= self.mid_tier_max_rank {
            return Err(AppError::Config(format!(
                "high_tier_max_rank ({}) must be < mid_tier_max_rank ({})",
                self.high_tier_max_rank, self.mid_tier_max_rank
            )));
        }

        let endpoint = self.feed_endpoint.trim();
        if endpoint.is_empty() {
            return Err(AppError::Config("feed_endpoint cannot be empty".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(AppError::Config(format!(
                "feed_endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        if self.fetch_timeout_ms == 0 {
            return Err(AppError::Config("fetch_timeout_ms must be > 0".to_string()));
        }

        Ok(())
    }

    /// Replace fields with `FEED_ENDPOINT` / `REFRESH_INTERVAL_MS` when set
    pub fn apply_env_overrides(&mut self) {
        if let Some(endpoint) = constants::feed_endpoint_override() {
            self.feed_endpoint = endpoint;
        }
        if let Some(interval) = constants::refresh_interval_override() {
            self.refresh_interval_ms = interval;
        }
    }
}

/// Output settings of the monitor binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Rows logged per publish
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Hide opportunities below this net spread (percent, 0.05 = 0.05%)
    #[serde(default)]
    pub min_spread_pct: Decimal,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_spread_pct: Decimal::ZERO,
        }
    }
}

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.scanner.validate()?;

        if self.display.top_n == 0 {
            return Err(AppError::Config("display.top_n must be > 0".to_string()));
        }
        if self.display.min_spread_pct.is_sign_negative() {
            return Err(AppError::Config(format!(
                "display.min_spread_pct cannot be negative (got {})",
                self.display.min_spread_pct
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serial_test::serial;

    fn valid_scanner() -> ScannerConfig {
        ScannerConfig {
            feed_endpoint: "https://api.loris.tools/funding".to_string(),
            refresh_interval_ms: 60_000,
            ..ScannerConfig::default()
        }
    }

    #[test]
    #[serial(env)]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.refresh_interval_ms, 60_000);
        assert_eq!(config.scanner.payments_per_day, 3);
        assert_eq!(config.scanner.high_tier_max_rank, 5);
        assert_eq!(config.scanner.mid_tier_max_rank, 15);
        assert_eq!(config.scanner.fetch_timeout_ms, 10_000);
        assert_eq!(config.scanner.rate_unit, RateUnit::BasisPoints);
        assert_eq!(config.scanner.retry_attempts, 0);
        assert_eq!(config.display.top_n, 10);
    }

    #[test]
    fn test_zero_interval_fails() {
        let mut scanner = valid_scanner();
        scanner.refresh_interval_ms = 0;
        let err = scanner.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_interval_ms must be > 0"));
    }

    #[test]
    fn test_payments_per_day_range() {
        let mut scanner = valid_scanner();
        scanner.payments_per_day = 0;
        assert!(scanner.validate().is_err());
        scanner.payments_per_day = 25;
        assert!(scanner.validate().unwrap_err().to_string().contains("payments_per_day"));
        scanner.payments_per_day = 24;
        assert!(scanner.validate().is_ok());
        scanner.payments_per_day = 1;
        assert!(scanner.validate().is_ok());
    }

    #[test]
    fn test_tier_thresholds_must_be_ordered() {
        let mut scanner = valid_scanner();
        scanner.high_tier_max_rank = 15;
        scanner.mid_tier_max_rank = 15;
        let err = scanner.validate().unwrap_err();
        assert!(err.to_string().contains("high_tier_max_rank"));
    }

    #[test]
    fn test_endpoint_rules() {
        let mut scanner = valid_scanner();
        scanner.feed_endpoint = "   ".to_string();
        assert!(scanner.validate().unwrap_err().to_string().contains("cannot be empty"));

        scanner.feed_endpoint = "ftp://example.com/funding".to_string();
        assert!(scanner.validate().unwrap_err().to_string().contains("http(s)"));

        scanner.feed_endpoint = "http://localhost:8080/funding".to_string();
        assert!(scanner.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut scanner = valid_scanner();
        scanner.fetch_timeout_ms = 0;
        assert!(scanner.validate().unwrap_err().to_string().contains("fetch_timeout_ms"));
    }

    #[test]
    fn test_display_rules() {
        let mut config = AppConfig {
            scanner: valid_scanner(),
            display: DisplayConfig::default(),
        };
        config.display.top_n = 0;
        assert!(config.validate().is_err());

        config.display.top_n = 5;
        config.display.min_spread_pct = dec!(-0.01);
        assert!(config.validate().unwrap_err().to_string().contains("min_spread_pct"));
    }

    #[test]
    #[serial(env)]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
scanner:
  payments_per_day: 24
  rate_unit: fraction
display:
  min_spread_pct: 0.05
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.payments_per_day, 24);
        assert_eq!(config.scanner.rate_unit, RateUnit::Fraction);
        assert_eq!(config.scanner.mid_tier_max_rank, 15);
        assert_eq!(config.display.min_spread_pct, dec!(0.05));
        assert_eq!(config.display.top_n, 10);
    }

    #[test]
    #[serial(env)]
    fn test_env_overrides_replace_file_values() {
        std::env::set_var("FEED_ENDPOINT", "http://127.0.0.1:9000/funding");
        std::env::set_var("REFRESH_INTERVAL_MS", "5000");

        let mut scanner = valid_scanner();
        scanner.apply_env_overrides();
        assert_eq!(scanner.feed_endpoint, "http://127.0.0.1:9000/funding");
        assert_eq!(scanner.refresh_interval_ms, 5000);

        std::env::remove_var("FEED_ENDPOINT");
        std::env::remove_var("REFRESH_INTERVAL_MS");
    }
}
