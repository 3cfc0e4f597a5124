//! Application configuration: a single validated record built once at
//! startup, loaded from a TOML file with environment-variable overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ConfigError, Result};

fn default_price_stale_threshold_ms() -> u64 {
    5_000
}

fn default_orderbook_stale_threshold_ms() -> u64 {
    3_000
}

fn default_min_arbitrage_spread_pct() -> f64 {
    0.5
}

fn default_min_confidence_score() -> f64 {
    0.6
}

fn default_min_executable_size_usd() -> f64 {
    10.0
}

fn default_ingestion_interval_ms() -> u64 {
    2_000
}

fn default_arbitrage_scan_interval_ms() -> u64 {
    1_000
}

fn default_matching_interval_ms() -> u64 {
    60_000
}

fn default_full_sync_interval_ms() -> u64 {
    300_000
}

fn default_true() -> bool {
    true
}

fn default_rate_limit_per_min() -> u32 {
    60
}

fn default_max_in_flight() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> String {
    "arbitrex.db".to_string()
}

fn default_app_prefix() -> String {
    "arbitrex".to_string()
}

/// Freshness/quality gates shared by the matcher and the detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_price_stale_threshold_ms")]
    pub price_stale_threshold_ms: u64,
    #[serde(default = "default_orderbook_stale_threshold_ms")]
    pub orderbook_stale_threshold_ms: u64,
    #[serde(default = "default_min_arbitrage_spread_pct")]
    pub min_arbitrage_spread_pct: f64,
    #[serde(default = "default_min_confidence_score")]
    pub min_confidence_score: f64,
    #[serde(default = "default_min_executable_size_usd")]
    pub min_executable_size_usd: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            price_stale_threshold_ms: default_price_stale_threshold_ms(),
            orderbook_stale_threshold_ms: default_orderbook_stale_threshold_ms(),
            min_arbitrage_spread_pct: default_min_arbitrage_spread_pct(),
            min_confidence_score: default_min_confidence_score(),
            min_executable_size_usd: default_min_executable_size_usd(),
        }
    }
}

/// Cadence of the four independent loops (§5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntervalsConfig {
    #[serde(default = "default_ingestion_interval_ms")]
    pub ingestion_interval_ms: u64,
    #[serde(default = "default_arbitrage_scan_interval_ms")]
    pub arbitrage_scan_interval_ms: u64,
    #[serde(default = "default_matching_interval_ms")]
    pub matching_interval_ms: u64,
    #[serde(default = "default_full_sync_interval_ms")]
    pub full_sync_interval_ms: u64,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            ingestion_interval_ms: default_ingestion_interval_ms(),
            arbitrage_scan_interval_ms: default_arbitrage_scan_interval_ms(),
            matching_interval_ms: default_matching_interval_ms(),
            full_sync_interval_ms: default_full_sync_interval_ms(),
        }
    }
}

/// Per-venue enable flag and rate limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_per_min")]
    pub rate_limit_per_min: u32,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: u32,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            rate_limit_per_min: default_rate_limit_per_min(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct VenuesConfig {
    #[serde(default)]
    pub polymarket: VenueConfig,
    #[serde(default)]
    pub kalshi: VenueConfig,
}

/// `tracing-subscriber` setup knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// The single validated configuration record the process runs from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub intervals: IntervalsConfig,
    #[serde(default)]
    pub venues: VenuesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default = "default_app_prefix")]
    pub app_prefix: String,
}

impl AppConfig {
    /// Load from a TOML file, then apply environment-variable overrides
    /// matching the names in §6, then validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load starting from defaults (no file), then apply env overrides.
    /// Used by tests and by `arbitrex run --no-config`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PRICE_STALE_THRESHOLD_MS") {
            if let Ok(v) = v.parse() {
                self.thresholds.price_stale_threshold_ms = v;
            }
        }
        if let Ok(v) = std::env::var("ORDERBOOK_STALE_THRESHOLD_MS") {
            if let Ok(v) = v.parse() {
                self.thresholds.orderbook_stale_threshold_ms = v;
            }
        }
        if let Ok(v) = std::env::var("MIN_ARBITRAGE_SPREAD_PCT") {
            if let Ok(v) = v.parse() {
                self.thresholds.min_arbitrage_spread_pct = v;
            }
        }
        if let Ok(v) = std::env::var("MIN_CONFIDENCE_SCORE") {
            if let Ok(v) = v.parse() {
                self.thresholds.min_confidence_score = v;
            }
        }
        if let Ok(v) = std::env::var("MIN_EXECUTABLE_SIZE_USD") {
            if let Ok(v) = v.parse() {
                self.thresholds.min_executable_size_usd = v;
            }
        }
        if let Ok(v) = std::env::var("INGESTION_INTERVAL_MS") {
            if let Ok(v) = v.parse() {
                self.intervals.ingestion_interval_ms = v;
            }
        }
        if let Ok(v) = std::env::var("ARBITRAGE_SCAN_INTERVAL_MS") {
            if let Ok(v) = v.parse() {
                self.intervals.arbitrage_scan_interval_ms = v;
            }
        }
        if let Ok(v) = std::env::var("MATCHING_INTERVAL_MS") {
            if let Ok(v) = v.parse() {
                self.intervals.matching_interval_ms = v;
            }
        }
        if let Ok(v) = std::env::var("ENABLE_POLYMARKET") {
            self.venues.polymarket.enabled = v != "0" && v.to_lowercase() != "false";
        }
        if let Ok(v) = std::env::var("ENABLE_KALSHI") {
            self.venues.kalshi.enabled = v != "0" && v.to_lowercase() != "false";
        }
        if let Ok(v) = std::env::var("POLYMARKET_RATE_LIMIT_PER_MIN") {
            if let Ok(v) = v.parse() {
                self.venues.polymarket.rate_limit_per_min = v;
            }
        }
        if let Ok(v) = std::env::var("KALSHI_RATE_LIMIT_PER_MIN") {
            if let Ok(v) = v.parse() {
                self.venues.kalshi.rate_limit_per_min = v;
            }
        }
        if let Ok(v) = std::env::var("DATABASE_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.thresholds.min_confidence_score < 0.0 || self.thresholds.min_confidence_score > 1.0 {
            return Err(ConfigError::Invalid(
                "min_confidence_score must be in [0,1]".to_string(),
            )
            .into());
        }
        if self.intervals.arbitrage_scan_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "arbitrage_scan_interval_ms must be > 0".to_string(),
            )
            .into());
        }
        if !self.venues.polymarket.enabled && !self.venues.kalshi.enabled {
            return Err(ConfigError::Invalid("at least one venue must be enabled".to_string()).into());
        }
        Ok(())
    }

    /// Install a global `tracing` subscriber per `self.logging`.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_new(&self.logging.level)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        if self.logging.json {
            tracing_subscriber::fmt().json().with_env_filter(filter).init();
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_spec_table() {
        let config = AppConfig::default();
        assert_eq!(config.thresholds.price_stale_threshold_ms, 5_000);
        assert_eq!(config.thresholds.orderbook_stale_threshold_ms, 3_000);
        assert!((config.thresholds.min_arbitrage_spread_pct - 0.5).abs() < 1e-9);
        assert!((config.thresholds.min_confidence_score - 0.6).abs() < 1e-9);
        assert!((config.thresholds.min_executable_size_usd - 10.0).abs() < 1e-9);
        assert_eq!(config.intervals.ingestion_interval_ms, 2_000);
        assert_eq!(config.intervals.arbitrage_scan_interval_ms, 1_000);
        assert_eq!(config.intervals.matching_interval_ms, 60_000);
    }

    #[test]
    fn load_parses_partial_toml_and_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nmin_confidence_score = 0.75\n").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert!((config.thresholds.min_confidence_score - 0.75).abs() < 1e-9);
        assert_eq!(config.intervals.matching_interval_ms, 60_000);
    }

    #[test]
    fn load_missing_file_returns_config_error() {
        let result = AppConfig::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut config = AppConfig::default();
        config.thresholds.min_confidence_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_all_venues_disabled() {
        let mut config = AppConfig::default();
        config.venues.polymarket.enabled = false;
        config.venues.kalshi.enabled = false;
        assert!(config.validate().is_err());
    }
}
