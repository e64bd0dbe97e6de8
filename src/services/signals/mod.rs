//! Trading signals service module.
//!
//! Provides the RSI/MACD indicator engine and the BUY/SELL/HOLD classifier.

pub mod classifier;
pub mod engine;
pub mod indicators;

pub use classifier::classify;
pub use engine::IndicatorEngine;

/// Trait for implementing technical indicators over a closing-price series.
pub trait Indicator: Send + Sync {
    /// Per-bar value type.
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> String;

    /// Number of closes required before the first fully defined value.
    fn min_periods(&self) -> usize;

    /// Calculate one entry per close, `None` inside the warm-up window.
    fn compute(&self, closes: &[f64]) -> Vec<Option<Self::Output>>;

    /// Most recent value, if defined.
    fn latest(&self, closes: &[f64]) -> Option<Self::Output> {
        self.compute(closes).pop().flatten()
    }
}
