//! CoinClerk - RSI/MACD trading signals with an append-only signal ledger

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;
