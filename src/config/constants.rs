//! Application-wide constants and configuration defaults
//!
//! Values that operators commonly tweak per deployment can be overridden via
//! environment variables (or a `.env` file loaded at startup).

use std::str::FromStr;

use crate::core::scheduler::DEFAULT_REFRESH_INTERVAL_MS;
use crate::feed::http::DEFAULT_FETCH_TIMEOUT_MS;

/// Aggregated funding endpoint used when nothing else is configured
pub const DEFAULT_FEED_ENDPOINT: &str = "https://api.loris.tools/funding";

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// =============================================================================
// Feed
// =============================================================================

/// Endpoint from the environment, if set and non-empty
///
/// Environment variable: `FEED_ENDPOINT`
pub fn feed_endpoint_override() -> Option<String> {
    std::env::var("FEED_ENDPOINT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Funding feed endpoint (default: `DEFAULT_FEED_ENDPOINT`)
pub fn feed_endpoint() -> String {
    feed_endpoint_override().unwrap_or_else(|| DEFAULT_FEED_ENDPOINT.to_string())
}

/// HTTP timeout for one fetch in milliseconds (default: 10000ms)
///
/// Environment variable: `FEED_TIMEOUT_MS`
pub fn fetch_timeout_ms() -> u64 {
    env_parse("FEED_TIMEOUT_MS").unwrap_or(DEFAULT_FETCH_TIMEOUT_MS)
}

// =============================================================================
// Scheduling
// =============================================================================

/// Interval from the environment, if set to a valid number
///
/// Environment variable: `REFRESH_INTERVAL_MS`
pub fn refresh_interval_override() -> Option<u64> {
    env_parse("REFRESH_INTERVAL_MS")
}

/// Refresh interval in milliseconds (default: 60000ms)
pub fn refresh_interval_ms() -> u64 {
    refresh_interval_override().unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print the effective scanner configuration (startup logs)
pub fn log_configuration(config: &crate::config::AppConfig) {
    let scanner = &config.scanner;
    tracing::info!("=== Scanner Configuration ===");
    tracing::info!("Feed:");
    tracing::info!("  - Endpoint: {}", scanner.feed_endpoint);
    tracing::info!("  - Timeout: {}ms", scanner.fetch_timeout_ms);
    tracing::info!("  - Rate unit: {:?}", scanner.rate_unit);
    tracing::info!("  - Retry attempts: {} (backoff {}ms)", scanner.retry_attempts, scanner.retry_backoff_ms);

    tracing::info!("Computation:");
    tracing::info!("  - Payments per day: {}", scanner.payments_per_day);
    tracing::info!(
        "  - OI tiers: High <= {}, Mid <= {}",
        scanner.high_tier_max_rank,
        scanner.mid_tier_max_rank
    );

    tracing::info!("Scheduling:");
    tracing::info!("  - Refresh interval: {}ms", scanner.refresh_interval_ms);

    tracing::info!("Display:");
    tracing::info!("  - Top: {}", config.display.top_n);
    tracing::info!("  - Min spread: {}%", config.display.min_spread_pct);
    tracing::info!("==================================");
}
