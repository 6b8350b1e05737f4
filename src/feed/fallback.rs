//! Fallback funding data
//!
//! Served whenever the live feed fails, so consumers get stale-but-present
//! data instead of an empty table. Preference order:
//! 1. the last live snapshot that was fetched successfully
//! 2. the versioned baseline embedded in the binary at build time

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::feed::errors::{FeedError, FeedResult};
use crate::feed::normalizer::Normalizer;
use crate::feed::types::{FeedSnapshot, RateUnit, RawFeedPayload, SnapshotOrigin};

/// Baseline dataset, rates in basis points
const EMBEDDED_BASELINE: &str = include_str!("../../data/fallback_funding.json");

#[derive(Debug, Deserialize)]
struct BaselineDocument {
    version: String,
    #[serde(flatten)]
    payload: RawFeedPayload,
}

/// Holds the baseline and last-known-good snapshots
#[derive(Debug, Clone)]
pub struct FallbackStore {
    version: String,
    baseline: FeedSnapshot,
    last_good: Option<FeedSnapshot>,
}

impl FallbackStore {
    /// Store backed by the dataset compiled into the binary
    pub fn embedded() -> FeedResult<Self> {
        Self::from_json(EMBEDDED_BASELINE, RateUnit::BasisPoints)
    }

    /// Store backed by a baseline document (`version` + feed payload)
    pub fn from_json(body: &str, unit: RateUnit) -> FeedResult<Self> {
        let doc: BaselineDocument = serde_json::from_str(body)
            .map_err(|e| FeedError::MalformedPayload(format!("fallback baseline: {}", e)))?;
        let baseline = Normalizer::new(unit).normalize_at(
            &doc.payload,
            Utc::now(),
            SnapshotOrigin::Fallback,
        );
        Ok(Self::from_snapshot(doc.version, baseline))
    }

    /// Store backed by an already-normalized baseline
    pub fn from_snapshot(version: impl Into<String>, baseline: FeedSnapshot) -> Self {
        Self {
            version: version.into(),
            baseline: baseline.with_origin(SnapshotOrigin::Fallback),
            last_good: None,
        }
    }

    /// Version tag of the embedded baseline
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Record a successful live snapshot as the new last-known-good
    pub fn remember(&mut self, snapshot: &FeedSnapshot) {
        if snapshot.is_live() {
            self.last_good = Some(snapshot.clone().with_origin(SnapshotOrigin::Fallback));
        }
    }

    /// When the last-known-good snapshot was originally fetched
    pub fn last_good_at(&self) -> Option<DateTime<Utc>> {
        self.last_good.as_ref().map(|s| s.fetched_at)
    }

    /// Fallback snapshot; never fails
    pub fn get_fallback(&self) -> FeedSnapshot {
        match &self.last_good {
            Some(snapshot) => {
                debug!(fetched_at = %snapshot.fetched_at, "Serving last-known-good snapshot");
                snapshot.clone()
            }
            None => {
                debug!(version = %self.version, "Serving embedded baseline snapshot");
                self.baseline.clone()
            }
        }
    }
}
