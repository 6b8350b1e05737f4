//! Core module - spread engine, ranking, scheduling and scan events
//!
//! This module uses explicit re-exports instead of glob exports
//! (`pub use module::*`) so the public API stays visible in one place.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use funding_scanner::core::{Scheduler, ScanResult, SpreadEngine};
//! ```

pub mod events;
pub mod ranker;
pub mod scheduler;
pub mod spread;
pub mod types;

// Explicit re-exports for types module
pub use types::{
    ArbitrageOpportunity, OiTier, ScanResult, ScannerState, DAYS_PER_YEAR,
    DEFAULT_PAYMENTS_PER_DAY, UNRANKED_OI_RANK,
};

// Explicit re-exports for spread module
pub use spread::{SkipReason, SpreadEngine};

// Explicit re-exports for ranker module
pub use ranker::{Ranker, TierThresholds, DEFAULT_HIGH_TIER_MAX_RANK, DEFAULT_MID_TIER_MAX_RANK};

// Explicit re-exports for scheduler module
pub use scheduler::{
    RefreshOutcome, ScannerHandle, Scheduler, SchedulerConfig, DEFAULT_REFRESH_INTERVAL_MS,
    DEFAULT_RETRY_BACKOFF_MS, DEGRADED_REASON,
};

// Explicit re-exports for events module
pub use events::{log_event, ScanEvent, ScanEventType};
