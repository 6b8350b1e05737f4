//! Refresh scheduler
//!
//! Drives `FeedClient → SpreadEngine → Ranker` on a fixed interval and
//! publishes each `ScanResult` through a `watch` channel.
//!
//! # State machine
//! `Idle → Fetching → {Ready | Degraded} → Fetching → ...`, back to `Idle` on
//! `stop()`. The first fetch starts as soon as the loop is spawned.
//!
//! # Guarantees
//! - At most one fetch is outstanding (`in_flight`).
//! - `refresh()` while a fetch is in flight or already queued is coalesced.
//! - Each fetch carries a sequence number; only the latest started fetch may
//!   publish, and nothing is published once the scheduler is cancelled.
//! - A feed failure never reaches consumers as an error: the fallback store
//!   is ranked instead and the result is flagged `is_degraded`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ScannerConfig;
use crate::core::events::{log_event, ScanEvent};
use crate::core::ranker::{Ranker, TierThresholds};
use crate::core::spread::SpreadEngine;
use crate::core::types::{ScanResult, ScannerState};
use crate::error::Result;
use crate::feed::{
    FallbackStore, FeedClient, FeedResult, FeedSnapshot, FeedSource, HttpFeedClient,
};

/// Prefix of `ScanResult::degraded_reason`
pub const DEGRADED_REASON: &str = "Using cached data (API unavailable)";

/// Default refresh interval
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Default first retry delay, doubled after each attempt
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

// =============================================================================
// Configuration
// =============================================================================

/// Timing policy of the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub refresh_interval: Duration,
    /// Extra fetch attempts inside one cycle before falling back
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            retry_attempts: 0,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl From<&ScannerConfig> for SchedulerConfig {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            retry_attempts: config.retry_attempts,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// What a `refresh()` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new fetch was queued
    Triggered,
    /// Folded into the fetch in flight or the one already queued
    Coalesced,
    /// The scheduler loop is not running
    NotRunning,
}

// =============================================================================
// Shared state
// =============================================================================

struct Shared {
    client: Arc<dyn FeedClient>,
    fallback: RwLock<FallbackStore>,
    engine: SpreadEngine,
    ranker: Ranker,
    config: SchedulerConfig,
    result_tx: watch::Sender<Arc<ScanResult>>,
    state_tx: watch::Sender<ScannerState>,
    in_flight: AtomicBool,
    refresh_pending: AtomicBool,
    latest_seq: AtomicU64,
    live_loops: AtomicUsize,
    refresh_notify: Notify,
}

impl Shared {
    fn refresh(&self) -> RefreshOutcome {
        if self.live_loops.load(Ordering::SeqCst) == 0 {
            return RefreshOutcome::NotRunning;
        }
        if self.in_flight.load(Ordering::SeqCst) {
            return RefreshOutcome::Coalesced;
        }
        if self.refresh_pending.swap(true, Ordering::SeqCst) {
            return RefreshOutcome::Coalesced;
        }
        self.refresh_notify.notify_one();
        RefreshOutcome::Triggered
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken, _guard: LoopGuard) {
        log_event(&ScanEvent::scanner_started(self.client.source_name()));

        let period = self.config.refresh_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.run_cycle(&cancel).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.refresh_notify.notified() => {
                    // A timer cycle may already have served this request
                    if !self.refresh_pending.load(Ordering::SeqCst) {
                        continue;
                    }
                }
            }
            self.run_cycle(&cancel).await;
            ticker.reset();
        }

        self.in_flight.store(false, Ordering::SeqCst);
        self.refresh_pending.store(false, Ordering::SeqCst);
        log_event(&ScanEvent::scanner_stopped(self.client.source_name()));
    }

    async fn run_cycle(&self, cancel: &CancellationToken) {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight.store(true, Ordering::SeqCst);
        self.refresh_pending.store(false, Ordering::SeqCst);
        self.state_tx.send_replace(ScannerState::Fetching);
        log_event(&ScanEvent::fetch_started(seq));

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.fetch_with_retry() => Some(result),
        };
        self.in_flight.store(false, Ordering::SeqCst);

        let Some(result) = outcome else {
            log_event(&ScanEvent::result_discarded(seq, "cancelled during fetch"));
            return;
        };
        if cancel.is_cancelled() {
            log_event(&ScanEvent::result_discarded(seq, "cancelled"));
            return;
        }
        if seq != self.latest_seq.load(Ordering::SeqCst) {
            log_event(&ScanEvent::result_discarded(seq, "superseded"));
            return;
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(snapshot) => {
                self.fallback.write().await.remember(&snapshot);
                self.publish(&snapshot, seq, None, latency_ms);
            }
            Err(e) => {
                warn!(
                    source = %self.client.source_name(),
                    error = %e,
                    kind = e.kind(),
                    "[FEED] Live fetch failed - serving fallback data"
                );
                let snapshot = self.fallback.read().await.get_fallback();
                let reason = format!("{}: {}", DEGRADED_REASON, e);
                self.publish(&snapshot, seq, Some(reason), latency_ms);
            }
        }
    }

    async fn fetch_with_retry(&self) -> FeedResult<FeedSnapshot> {
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;
        loop {
            match self.client.fetch_snapshot().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if attempt < self.config.retry_attempts => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_attempts = self.config.retry_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "[FEED] Fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn publish(
        &self,
        snapshot: &FeedSnapshot,
        seq: u64,
        degraded_reason: Option<String>,
        latency_ms: u64,
    ) {
        let opportunities = self.ranker.rank(self.engine.compute_opportunities(snapshot));
        let is_degraded = degraded_reason.is_some();
        let result = ScanResult {
            opportunities,
            last_fetched_at: Some(Utc::now()),
            is_degraded,
            degraded_reason,
            origin: Some(snapshot.origin),
            sequence: seq,
        };

        let next_state = if is_degraded {
            ScannerState::Degraded
        } else {
            ScannerState::Ready
        };
        if !is_degraded && self.result_tx.borrow().is_degraded {
            log_event(&ScanEvent::feed_recovered(seq));
        }
        log_event(&ScanEvent::cycle_published(&result, latency_ms));

        self.result_tx.send_replace(Arc::new(result));
        self.state_tx.send_replace(next_state);
    }
}

/// Keeps `live_loops` accurate even if the loop future is dropped unpolled
struct LoopGuard {
    shared: Arc<Shared>,
}

impl LoopGuard {
    fn new(shared: Arc<Shared>) -> Self {
        shared.live_loops.fetch_add(1, Ordering::SeqCst);
        Self { shared }
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.shared.live_loops.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Public API
// =============================================================================

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the refresh loop; hand out `ScannerHandle`s to readers.
pub struct Scheduler {
    shared: Arc<Shared>,
    running: Option<Running>,
}

impl Scheduler {
    pub fn new(
        client: Arc<dyn FeedClient>,
        fallback: FallbackStore,
        engine: SpreadEngine,
        ranker: Ranker,
        config: SchedulerConfig,
    ) -> Self {
        let (result_tx, _) = watch::channel(Arc::new(ScanResult::empty()));
        let (state_tx, _) = watch::channel(ScannerState::Idle);
        Self {
            shared: Arc::new(Shared {
                client,
                fallback: RwLock::new(fallback),
                engine,
                ranker,
                config,
                result_tx,
                state_tx,
                in_flight: AtomicBool::new(false),
                refresh_pending: AtomicBool::new(false),
                latest_seq: AtomicU64::new(0),
                live_loops: AtomicUsize::new(0),
                refresh_notify: Notify::new(),
            }),
            running: None,
        }
    }

    /// Scheduler wired to the HTTP feed and the embedded fallback dataset
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let source = FeedSource::new(config.feed_endpoint.clone())
            .with_timeout(Duration::from_millis(config.fetch_timeout_ms))
            .with_rate_unit(config.rate_unit);
        let client = HttpFeedClient::new(source)?;
        let fallback = FallbackStore::embedded()?;
        Ok(Self::new(
            Arc::new(client),
            fallback,
            SpreadEngine::new(config.payments_per_day),
            Ranker::new(TierThresholds::new(
                config.high_tier_max_rank,
                config.mid_tier_max_rank,
            )),
            SchedulerConfig::from(config),
        ))
    }

    /// Spawn the refresh loop; the first fetch starts immediately.
    ///
    /// Must be called from within a tokio runtime. No-op if already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            warn!("Scheduler already running - start ignored");
            return;
        }
        // Set before spawning so a refresh() right after start() coalesces
        self.shared.in_flight.store(true, Ordering::SeqCst);
        self.shared.state_tx.send_replace(ScannerState::Fetching);

        let cancel = CancellationToken::new();
        let guard = LoopGuard::new(self.shared.clone());
        let handle = tokio::spawn(self.shared.clone().run_loop(cancel.clone(), guard));
        self.running = Some(Running { cancel, handle });
    }

    /// Cancel the loop, wait for it to exit and return to `Idle`.
    ///
    /// A fetch in flight is abandoned and its result never published.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        self.shared.in_flight.store(false, Ordering::SeqCst);
        self.shared.state_tx.send_replace(ScannerState::Idle);
        info!(live_loops = self.live_loops(), "Scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Ask for an immediate fetch
    pub fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh()
    }

    /// Most recently published result
    pub fn latest(&self) -> Arc<ScanResult> {
        self.shared.result_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ScanResult>> {
        self.shared.result_tx.subscribe()
    }

    pub fn state(&self) -> ScannerState {
        *self.shared.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ScannerState> {
        self.shared.state_tx.subscribe()
    }

    /// Number of refresh loops currently alive (0 or 1 for a single scheduler)
    pub fn live_loops(&self) -> usize {
        self.shared.live_loops.load(Ordering::SeqCst)
    }

    /// Cloneable read/refresh handle for consumers
    pub fn handle(&self) -> ScannerHandle {
        ScannerHandle {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

/// Consumer-side view of a scheduler: latest result, state, refresh.
#[derive(Clone)]
pub struct ScannerHandle {
    shared: Arc<Shared>,
}

impl ScannerHandle {
    pub fn latest(&self) -> Arc<ScanResult> {
        self.shared.result_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ScanResult>> {
        self.shared.result_tx.subscribe()
    }

    pub fn state(&self) -> ScannerState {
        *self.shared.state_tx.borrow()
    }

    pub fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh()
    }
}

// =============================================================================
// Tests
// =============================================================================
