//! Funding Scanner - Monitor Entry Point
//!
//! 1. Loads configuration (`config.yaml`, or `CONFIG_PATH`)
//! 2. Starts the refresh scheduler against the funding feed
//! 3. Logs the top opportunities on every publish
//! 4. Stops cleanly on Ctrl+C

use std::path::PathBuf;

use rust_decimal::Decimal;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use funding_scanner::config::{self, constants, logging::init_logging, AppConfig};
use funding_scanner::core::{ScanResult, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    init_logging();

    info!("Funding scanner starting...");

    let config_path = PathBuf::from(
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string()),
    );
    let config = if config_path.exists() {
        match config::load_config(&config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("[CONFIG] Configuration failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        warn!(path = %config_path.display(), "[CONFIG] File not found - using defaults");
        let mut cfg = AppConfig::default();
        cfg.scanner.apply_env_overrides();
        cfg.validate()?;
        cfg
    };
    constants::log_configuration(&config);

    let mut scheduler = Scheduler::from_config(&config.scanner)?;
    let mut results = scheduler.subscribe();
    scheduler.start();

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("[SHUTDOWN] Graceful shutdown initiated");
                let _ = shutdown_signal.send(());
            }
            Err(err) => {
                error!("Failed to listen for Ctrl+C signal: {}", err);
            }
        }
    });

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("[SHUTDOWN] Shutdown signal received in main task");
                break;
            }
            changed = results.changed() => {
                if changed.is_err() {
                    warn!("Result channel closed");
                    break;
                }
                let result = results.borrow_and_update().clone();
                report(&result, &config);
            }
        }
    }

    scheduler.stop().await;
    info!("[SHUTDOWN] Clean exit");
    Ok(())
}

/// Log the filtered top rows of one published result
fn report(result: &ScanResult, config: &AppConfig) {
    let rows = result.filter_min_spread_pct(config.display.min_spread_pct);
    info!(
        sequence = result.sequence,
        total = result.len(),
        shown = rows.len().min(config.display.top_n),
        degraded = result.is_degraded,
        reason = ?result.degraded_reason,
        "[SCAN] Opportunities updated"
    );

    for (i, opp) in rows.iter().take(config.display.top_n).enumerate() {
        info!(
            rank = i + 1,
            symbol = %opp.symbol,
            long = %format!("{} ({:.4}%)", opp.long_exchange, opp.long_rate.saturating_mul(Decimal::ONE_HUNDRED)),
            short = %format!("{} ({:.4}%)", opp.short_exchange, opp.short_rate.saturating_mul(Decimal::ONE_HUNDRED)),
            spread = %format!("{:.4}%", opp.net_spread_pct()),
            apr = %format!("{:.2}%", opp.annualized_pct()),
            oi_rank = opp.open_interest_rank,
            oi_tier = ?opp.open_interest_tier,
            ""
        );
    }
}
