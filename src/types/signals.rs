use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Trading signal produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Value persisted in the `signal` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// Parse a stored signal label.
    ///
    /// Accepts the Vietnamese labels (`MUA`, `BÁN`, `GIỮ`) written by older
    /// ledgers alongside the current English ones.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "MUA" => Some(Signal::Buy),
            "SELL" | "BÁN" => Some(Signal::Sell),
            "HOLD" | "GIỮ" => Some(Signal::Hold),
            _ => None,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted signal evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    /// Ledger-assigned identifier, increasing with every append.
    pub id: i64,
    pub ticker: String,
    /// Last close at evaluation time.
    pub price: f64,
    pub rsi: f64,
    /// MACD main line value fed to the classifier.
    pub macd: f64,
    pub signal: Signal,
    pub created_at: DateTime<Utc>,
}

impl SignalRecord {
    /// Creation time formatted for history tables.
    pub fn display_time(&self) -> String {
        self.created_at.format("%d/%m/%Y %H:%M").to_string()
    }
}

/// Fields of a record about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignalRecord {
    pub ticker: String,
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: Signal,
    /// Filled with the current time on append when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewSignalRecord {
    /// Create a record stamped at append time.
    pub fn new(ticker: impl Into<String>, price: f64, rsi: f64, macd: f64, signal: Signal) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            rsi,
            macd,
            signal,
            created_at: None,
        }
    }

    /// Set an explicit creation time.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// One MACD observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    /// Fast EMA minus slow EMA.
    pub main: f64,
    /// EMA of the main line; `None` until its own warm-up completes.
    pub signal: Option<f64>,
    /// `main - signal` whenever the signal line is defined.
    pub histogram: Option<f64>,
}

/// Per-bar indicator values derived from one price series.
///
/// Every vector has the input length. `None` marks bars inside an
/// indicator's warm-up window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: Vec<Option<f64>>,
    pub macd_main: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    /// Bars needed before every indicator has a defined latest value.
    pub required_bars: usize,
}

impl IndicatorSnapshot {
    /// Number of bars this snapshot covers.
    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().copied().flatten()
    }

    pub fn latest_macd_main(&self) -> Option<f64> {
        self.macd_main.last().copied().flatten()
    }

    pub fn latest_macd_signal(&self) -> Option<f64> {
        self.macd_signal.last().copied().flatten()
    }

    /// Fail with `InsufficientData` unless every latest value is defined.
    pub fn check_warm_up(&self) -> Result<()> {
        let ready = self.latest_rsi().is_some()
            && self.latest_macd_main().is_some()
            && self.latest_macd_signal().is_some();

        if ready {
            Ok(())
        } else {
            Err(AppError::InsufficientData {
                required: self.required_bars,
                available: self.len(),
            })
        }
    }
}
