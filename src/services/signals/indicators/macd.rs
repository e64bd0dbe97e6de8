//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::Ema;
use crate::services::signals::Indicator;
use crate::types::MacdPoint;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    /// Create a MACD with custom spans. A fast span longer than the slow one
    /// is swapped.
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        let (fast_period, slow_period) = if slow_period < fast_period {
            (slow_period, fast_period)
        } else {
            (fast_period, slow_period)
        };

        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

/// Calculate the MACD series.
///
/// A point is `None` until the slow EMA is defined; its `signal` stays
/// `None` until `signal_period` main values exist.
pub fn compute_macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Vec<Option<MacdPoint>> {
    let fast_ema = Ema::new(fast_period).compute(closes);
    let slow_ema = Ema::new(slow_period).compute(closes);

    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(fast, slow)| match (fast, slow) {
            (Some(fast), Some(slow)) => Some(fast - slow),
            _ => None,
        })
        .collect();

    // Signal line (EMA of MACD) runs over the defined tail only
    let mut signal_line = vec![None; closes.len()];
    if let Some(start) = macd_line.iter().position(Option::is_some) {
        let defined: Vec<f64> = macd_line[start..].iter().flatten().copied().collect();
        let signal_ema = Ema::new(signal_period).compute(&defined);
        for (offset, value) in signal_ema.into_iter().enumerate() {
            signal_line[start + offset] = value;
        }
    }

    macd_line
        .into_iter()
        .zip(signal_line)
        .map(|(main, signal)| {
            main.map(|main| MacdPoint {
                main,
                signal,
                histogram: signal.map(|signal| main - signal),
            })
        })
        .collect()
}

impl Indicator for Macd {
    type Output = MacdPoint;

    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> String {
        format!(
            "MACD ({}, {}, {})",
            self.fast_period, self.slow_period, self.signal_period
        )
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period.max(1) - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<Option<MacdPoint>> {
        compute_macd(
            closes,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        )
    }
}
