use std::env;
use std::path::PathBuf;

use crate::types::{Interval, Period};

/// Indicator lookback configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    /// RSI lookback (default: 14).
    pub rsi_period: usize,
    /// MACD fast EMA span (default: 12).
    pub macd_fast: usize,
    /// MACD slow EMA span (default: 26).
    pub macd_slow: usize,
    /// MACD signal EMA span (default: 9).
    pub macd_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file holding the signal ledger.
    pub db_path: PathBuf,
    /// Ticker evaluated when none is given.
    pub default_ticker: String,
    pub default_interval: Interval,
    pub default_period: Period,
    /// Rows shown in the history table.
    pub history_limit: usize,
    pub indicators: IndicatorConfig,
    /// Refuse to classify while any indicator is still warming up.
    pub strict_warm_up: bool,
    /// Market-data request timeout (seconds).
    pub fetch_timeout_secs: u64,
    /// How long a store operation waits on another process's lock (ms).
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("coinclerk.db"),
            default_ticker: "AAPL".to_string(),
            default_interval: Interval::OneDay,
            default_period: Period::OneMonth,
            history_limit: 50,
            indicators: IndicatorConfig::default(),
            strict_warm_up: false,
            fetch_timeout_secs: 30,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            db_path: env::var("COINCLERK_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            default_ticker: env::var("DEFAULT_TICKER")
                .map(|t| t.trim().to_uppercase())
                .unwrap_or(defaults.default_ticker),
            default_interval: env::var("DEFAULT_INTERVAL")
                .ok()
                .and_then(|v| Interval::parse(&v))
                .unwrap_or(defaults.default_interval),
            default_period: env::var("DEFAULT_PERIOD")
                .ok()
                .and_then(|v| Period::parse(&v))
                .unwrap_or(defaults.default_period),
            history_limit: env::var("HISTORY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.history_limit),
            indicators: IndicatorConfig {
                rsi_period: env::var("RSI_PERIOD")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.indicators.rsi_period),
                macd_fast: env::var("MACD_FAST")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.indicators.macd_fast),
                macd_slow: env::var("MACD_SLOW")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.indicators.macd_slow),
                macd_signal: env::var("MACD_SIGNAL")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.indicators.macd_signal),
            },
            strict_warm_up: env::var("STRICT_WARM_UP")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.strict_warm_up),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_secs),
            busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.busy_timeout_ms),
        }
    }
}
