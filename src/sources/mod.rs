//! Market-data sources.

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::types::{Interval, Period, PriceBar};
use std::future::Future;

/// Supplies the price history an evaluation runs on.
pub trait SeriesFetcher {
    /// Fetch bars for `ticker`, oldest first. An empty vec means the source
    /// has no data for this request.
    fn fetch_series(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> impl Future<Output = Result<Vec<PriceBar>>> + Send;
}

/// Quick-pick commodity futures (display name, ticker).
pub const COMMODITIES: &[(&str, &str)] = &[
    ("Silver", "SI=F"),
    ("Gold", "GC=F"),
    ("WTI Crude Oil", "CL=F"),
    ("Copper", "HG=F"),
    ("Platinum", "PL=F"),
    ("Natural Gas", "NG=F"),
    ("Soybean", "ZS=F"),
    ("Corn", "ZC=F"),
    ("Wheat", "ZW=F"),
];

/// Map a commodity name to its futures ticker; anything else is treated as
/// a manually entered ticker and upper-cased.
pub fn resolve_ticker(input: &str) -> String {
    let input = input.trim();
    COMMODITIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(input))
        .map(|(_, ticker)| ticker.to_string())
        .unwrap_or_else(|| input.to_uppercase())
}

/// Display name of a quick-pick ticker.
pub fn commodity_name(ticker: &str) -> Option<&'static str> {
    COMMODITIES
        .iter()
        .find(|(_, t)| t.eq_ignore_ascii_case(ticker))
        .map(|(name, _)| *name)
}
