//! Configuration module for scanner settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `ScannerConfig`, `DisplayConfig`)
//! - YAML loading functionality (`load_config`)
//! - Application constants with environment variable overrides
//! - Logging initialization (`logging::init_logging`)

pub mod constants;
mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{AppConfig, DisplayConfig, ScannerConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};
