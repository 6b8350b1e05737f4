//! Structured scan events
//!
//! Every scheduler lifecycle step and cycle outcome goes through
//! `log_event`, so JSON logs carry the same field set for each event type.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::types::ScanResult;

/// Type of scan event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEventType {
    ScannerStarted,
    FetchStarted,
    ScanCompleted,
    ScanDegraded,
    FeedRecovered,
    ResultDiscarded,
    ScannerStopped,
}

impl fmt::Display for ScanEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEventType::ScannerStarted => write!(f, "SCANNER_STARTED"),
            ScanEventType::FetchStarted => write!(f, "FETCH_STARTED"),
            ScanEventType::ScanCompleted => write!(f, "SCAN_COMPLETED"),
            ScanEventType::ScanDegraded => write!(f, "SCAN_DEGRADED"),
            ScanEventType::FeedRecovered => write!(f, "FEED_RECOVERED"),
            ScanEventType::ResultDiscarded => write!(f, "RESULT_DISCARDED"),
            ScanEventType::ScannerStopped => write!(f, "SCANNER_STOPPED"),
        }
    }
}

/// One scan event with optional context fields
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub event_type: ScanEventType,
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub sequence: Option<u64>,
    pub opportunities: Option<usize>,
    /// Best net spread of the cycle, in percent
    pub best_spread_pct: Option<String>,
    pub best_symbol: Option<String>,
    pub latency_ms: Option<u64>,
    pub reason: Option<String>,
}

impl ScanEvent {
    pub fn new(event_type: ScanEventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            source: None,
            sequence: None,
            opportunities: None,
            best_spread_pct: None,
            best_symbol: None,
            latency_ms: None,
            reason: None,
        }
    }

    pub fn scanner_started(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..Self::new(ScanEventType::ScannerStarted)
        }
    }

    pub fn fetch_started(sequence: u64) -> Self {
        Self {
            sequence: Some(sequence),
            ..Self::new(ScanEventType::FetchStarted)
        }
    }

    /// SCAN_COMPLETED or SCAN_DEGRADED depending on `result.is_degraded`
    pub fn cycle_published(result: &ScanResult, latency_ms: u64) -> Self {
        let event_type = if result.is_degraded {
            ScanEventType::ScanDegraded
        } else {
            ScanEventType::ScanCompleted
        };
        let best = result.opportunities.first();
        Self {
            sequence: Some(result.sequence),
            opportunities: Some(result.len()),
            best_spread_pct: best.map(|o| format!("{:.4}%", o.net_spread_pct())),
            best_symbol: best.map(|o| o.symbol.clone()),
            latency_ms: Some(latency_ms),
            reason: result.degraded_reason.clone(),
            ..Self::new(event_type)
        }
    }

    pub fn feed_recovered(sequence: u64) -> Self {
        Self {
            sequence: Some(sequence),
            ..Self::new(ScanEventType::FeedRecovered)
        }
    }

    pub fn result_discarded(sequence: u64, reason: &str) -> Self {
        Self {
            sequence: Some(sequence),
            reason: Some(reason.to_string()),
            ..Self::new(ScanEventType::ResultDiscarded)
        }
    }

    pub fn scanner_stopped(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..Self::new(ScanEventType::ScannerStopped)
        }
    }
}

/// Log a scan event using structured tracing fields
///
/// Degraded cycles log at WARN, per-fetch and discard events at DEBUG,
/// everything else at INFO.
pub fn log_event(event: &ScanEvent) {
    let event_type = event.event_type.to_string();
    let timestamp = event.timestamp.to_rfc3339();

    match event.event_type {
        ScanEventType::FetchStarted | ScanEventType::ResultDiscarded => {
            debug!(
                event_type = %event_type,
                timestamp = %timestamp,
                sequence = ?event.sequence,
                reason = ?event.reason,
                ""
            );
        }
        ScanEventType::ScanDegraded => {
            warn!(
                event_type = %event_type,
                timestamp = %timestamp,
                sequence = ?event.sequence,
                opportunities = ?event.opportunities,
                best_symbol = ?event.best_symbol,
                best_spread = ?event.best_spread_pct,
                latency_ms = ?event.latency_ms,
                reason = ?event.reason,
                ""
            );
        }
        _ => {
            info!(
                event_type = %event_type,
                timestamp = %timestamp,
                source = ?event.source,
                sequence = ?event.sequence,
                opportunities = ?event.opportunities,
                best_symbol = ?event.best_symbol,
                best_spread = ?event.best_spread_pct,
                latency_ms = ?event.latency_ms,
                ""
            );
        }
    }
}
