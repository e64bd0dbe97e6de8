//! Technical indicator implementations.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::{ema_series, Ema};
pub use macd::{compute_macd, Macd};
pub use rsi::{compute_rsi, Rsi};
