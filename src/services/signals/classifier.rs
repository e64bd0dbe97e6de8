//! BUY/SELL/HOLD decision rule.

use crate::types::Signal;

/// RSI below which a series counts as oversold.
pub const OVERSOLD: f64 = 30.0;
/// RSI above which a series counts as overbought.
pub const OVERBOUGHT: f64 = 70.0;

/// Classify the latest indicator values.
///
/// First match wins:
/// 1. `rsi < 30` and MACD main above its signal line -> BUY
/// 2. `rsi > 70` and MACD main below its signal line -> SELL
/// 3. otherwise HOLD
pub fn classify(rsi: f64, macd_main: f64, macd_signal: f64) -> Signal {
    if rsi < OVERSOLD && macd_main > macd_signal {
        Signal::Buy
    } else if rsi > OVERBOUGHT && macd_main < macd_signal {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
