//! Yahoo Finance API client for historical price data.
//!
//! Provides OHLC bars for stocks, ETFs and futures through the unofficial
//! chart endpoint.

use crate::error::{AppError, Result};
use crate::sources::SeriesFetcher;
use crate::types::{Interval, Period, PriceBar};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Parse a chart response body into bars, oldest first.
///
/// Bars without a positive close are skipped. A repeated timestamp (Yahoo
/// re-sends the live bar) replaces the earlier bar. "Not Found" errors mean
/// no data and yield an empty vec.
fn parse_chart_response(body: &str) -> Result<Vec<PriceBar>> {
    let data: YahooChartResponse = serde_json::from_str(body)?;

    if let Some(error) = data.chart.error {
        if error.code == "Not Found" {
            warn!("Yahoo has no data: {}", error.description);
            return Ok(Vec::new());
        }
        return Err(AppError::Fetch(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &seconds) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        // Skip invalid data points
        if close <= 0.0 || !close.is_finite() {
            continue;
        }
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(seconds, 0) else {
            continue;
        };

        let bar = PriceBar {
            timestamp,
            open: opens.get(i).copied().flatten().unwrap_or(close),
            high: highs.get(i).copied().flatten().unwrap_or(close),
            low: lows.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: volumes.get(i).copied().flatten(),
        };

        match bars.last_mut() {
            Some(last) if last.timestamp >= bar.timestamp => {
                if last.timestamp == bar.timestamp {
                    *last = bar;
                }
            }
            _ => bars.push(bar),
        }
    }

    Ok(bars)
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client })
    }

    /// Fetch historical bars for a symbol.
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let url = format!(
            "{}/{}?range={}&interval={}&includePrePost=false",
            CHART_URL,
            normalize_yahoo_symbol(symbol),
            period.as_str(),
            interval.as_str()
        );

        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Error responses still carry a chart.error body worth reading
        match parse_chart_response(&body) {
            Ok(bars) => {
                debug!("Yahoo returned {} bars for {}", bars.len(), symbol);
                Ok(bars)
            }
            Err(AppError::SerdeJson(_)) if !status.is_success() => {
                Err(AppError::Fetch(format!("API error: {}", status)))
            }
            Err(e) => Err(e),
        }
    }
}

impl SeriesFetcher for YahooFinanceClient {
    async fn fetch_series(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        self.get_historical_data(ticker, period, interval).await
    }
}
