//! Funding Rate Arbitrage Scanner
//!
//! Pulls funding rates for perpetual futures across exchanges and ranks,
//! per symbol, the best long/short pair:
//! - Funding feed client with embedded fallback data
//! - Spread engine (net spread, daily and annualized return)
//! - Open-interest tiers and ranking
//! - Refresh scheduler publishing the latest `ScanResult`

pub mod config;
pub mod core;
pub mod error;
pub mod feed;

pub use error::AppError;
