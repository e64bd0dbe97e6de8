//! Indicator engine producing per-bar RSI and MACD snapshots.

use crate::config::IndicatorConfig;
use crate::services::signals::indicators::{Macd, Rsi};
use crate::services::signals::Indicator;
use crate::types::{closes, IndicatorSnapshot, MacdPoint, PriceBar};
use tracing::debug;

/// Computes every indicator the classifier consumes.
pub struct IndicatorEngine {
    rsi: Rsi,
    macd: Macd,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            rsi: Rsi::default(),
            macd: Macd::default(),
        }
    }
}

impl IndicatorEngine {
    /// Create an engine with custom lookbacks.
    pub fn new(rsi_period: usize, fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            rsi: Rsi::new(rsi_period),
            macd: Macd::new(fast, slow, signal),
        }
    }

    pub fn from_config(config: &IndicatorConfig) -> Self {
        Self::new(
            config.rsi_period,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        )
    }

    /// RSI per close.
    pub fn rsi(&self, closes: &[f64]) -> Vec<Option<f64>> {
        self.rsi.compute(closes)
    }

    /// MACD per close.
    pub fn macd(&self, closes: &[f64]) -> Vec<Option<MacdPoint>> {
        self.macd.compute(closes)
    }

    /// Bars needed before every latest value is defined.
    pub fn required_bars(&self) -> usize {
        self.rsi.min_periods().max(self.macd.min_periods())
    }

    /// Compute all indicators for a bar sequence.
    pub fn snapshot(&self, bars: &[PriceBar]) -> IndicatorSnapshot {
        let closes = closes(bars);
        let macd = self.macd(&closes);

        debug!(
            "Computing {} and {} over {} bars",
            self.rsi.name(),
            self.macd.name(),
            closes.len()
        );

        IndicatorSnapshot {
            rsi: self.rsi(&closes),
            macd_main: macd.iter().map(|p| p.map(|p| p.main)).collect(),
            macd_signal: macd.iter().map(|p| p.and_then(|p| p.signal)).collect(),
            macd_histogram: macd.iter().map(|p| p.and_then(|p| p.histogram)).collect(),
            required_bars: self.required_bars(),
        }
    }
}
