//! Relative Strength Index (RSI) indicator.

use crate::services::signals::Indicator;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

/// Calculate the RSI series using Wilder smoothing.
///
/// The first `period` entries are `None`; entry `period` is seeded from the
/// simple averages of the first `period` deltas. An average loss of exactly
/// zero yields 100.
pub fn compute_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, change.abs())
            }
        })
        .unzip();

    let period_f = period as f64;

    // Calculate initial averages
    let mut avg_gain = gains.iter().take(period).sum::<f64>() / period_f;
    let mut avg_loss = losses.iter().take(period).sum::<f64>() / period_f;
    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // Use smoothed averages for remaining data
    for (i, (gain, loss)) in gains.iter().zip(&losses).enumerate().skip(period) {
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        // Delta i ends at close i + 1
        out[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn name(&self) -> String {
        format!("RSI ({})", self.period)
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        compute_rsi(closes, self.period)
    }
}
