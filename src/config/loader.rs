//! Configuration loader for YAML files
//!
//! Parses, applies environment overrides, then validates.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::AppError;

use super::types::AppConfig;

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Applies `FEED_ENDPOINT` / `REFRESH_INTERVAL_MS` overrides
/// 4. Validates the configuration rules
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use funding_scanner::config::load_config;
///
/// let config = load_config(Path::new("config.yaml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!(
            "YAML parse error in '{}': {}",
            path.display(),
            e
        ))
    })?;

    config.scanner.apply_env_overrides();
    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let mut config: AppConfig = serde_yaml::from_str(yaml_content).map_err(|e| {
        AppError::Config(format!("YAML parse error: {}", e))
    })?;

    config.scanner.apply_env_overrides();
    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::RateUnit;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG_YAML: &str = r#"
scanner:
  refresh_interval_ms: 30000
  payments_per_day: 3
  feed_endpoint: https://api.loris.tools/funding
  high_tier_max_rank: 5
  mid_tier_max_rank: 15
  fetch_timeout_ms: 8000
  rate_unit: basis_points
  retry_attempts: 2
  retry_backoff_ms: 500
display:
  top_n: 5
  min_spread_pct: 0.02
"#;

    #[test]
    #[serial(env)]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(VALID_CONFIG_YAML).unwrap();
        assert_eq!(config.scanner.refresh_interval_ms, 30_000);
        assert_eq!(config.scanner.fetch_timeout_ms, 8_000);
        assert_eq!(config.scanner.rate_unit, RateUnit::BasisPoints);
        assert_eq!(config.scanner.retry_attempts, 2);
        assert_eq!(config.display.top_n, 5);
    }

    #[test]
    fn test_load_config_from_str_invalid_yaml() {
        let result = load_config_from_str("invalid: yaml: content: [");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_str_validation_failure() {
        let invalid_config = r#"
scanner:
  high_tier_max_rank: 20
  mid_tier_max_rank: 10
"#;
        let result = load_config_from_str(invalid_config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("high_tier_max_rank"));
    }

    #[test]
    #[serial(env)]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.scanner.payments_per_day, 3);
        assert_eq!(config.display.top_n, 10);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Configuration file not found"));
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_file_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(VALID_CONFIG_YAML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.scanner.feed_endpoint, "https://api.loris.tools/funding");
        assert_eq!(config.scanner.retry_backoff_ms, 500);
    }

    #[test]
    fn test_load_config_from_file_invalid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid: [yaml: content").unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    #[serial(env)]
    fn test_env_override_applied_before_validation() {
        std::env::set_var("REFRESH_INTERVAL_MS", "0");
        let result = load_config_from_str(VALID_CONFIG_YAML);
        std::env::remove_var("REFRESH_INTERVAL_MS");

        assert!(result.unwrap_err().to_string().contains("refresh_interval_ms"));
    }
}
