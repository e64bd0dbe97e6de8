//! Single-ticker evaluation: fetch -> indicators -> classify -> store -> history.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::signals::{classify, IndicatorEngine};
use crate::services::SignalStore;
use crate::sources::SeriesFetcher;
use crate::types::{
    IndicatorSnapshot, Interval, NewSignalRecord, Period, PriceBar, Signal, SignalRecord,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// RSI fed to the classifier while RSI is still warming up.
pub const NEUTRAL_RSI: f64 = 50.0;
/// MACD main and signal fed to the classifier while MACD is still warming up.
pub const NEUTRAL_MACD: f64 = 0.0;

/// What to do when the latest indicator values are undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmUpPolicy {
    /// Classify with neutral values, which always yield HOLD.
    #[default]
    NeutralDefaults,
    /// Fail the evaluation with `InsufficientData`.
    Reject,
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
}

impl EvaluationRequest {
    pub fn new(ticker: impl Into<String>, period: Period, interval: Interval) -> Self {
        Self {
            ticker: ticker.into(),
            period,
            interval,
        }
    }
}

/// Latest indicator values, with neutral stand-ins where undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierInputs {
    pub rsi: f64,
    /// Recorded in the ledger's `macd` column.
    pub macd_main: f64,
    pub macd_signal: f64,
    /// Whether any value is a neutral stand-in.
    pub defaults_applied: bool,
    /// Both MACD lines are defined.
    pub macd_ready: bool,
}

impl ClassifierInputs {
    /// Take the latest snapshot values, substituting a neutral one for each
    /// undefined value.
    pub fn with_neutral_defaults(snapshot: &IndicatorSnapshot) -> Self {
        let rsi = snapshot.latest_rsi();
        let macd_main = snapshot.latest_macd_main();
        let macd_signal = snapshot.latest_macd_signal();

        Self {
            rsi: rsi.unwrap_or(NEUTRAL_RSI),
            macd_main: macd_main.unwrap_or(NEUTRAL_MACD),
            macd_signal: macd_signal.unwrap_or(NEUTRAL_MACD),
            defaults_applied: rsi.is_none() || macd_main.is_none() || macd_signal.is_none(),
            macd_ready: macd_main.is_some() && macd_signal.is_some(),
        }
    }

    /// Classify these values. Until both MACD lines are defined the
    /// classifier sees them as equal, so a half-warmed MACD never trades.
    pub fn classify(&self) -> Signal {
        if self.macd_ready {
            classify(self.rsi, self.macd_main, self.macd_signal)
        } else {
            classify(self.rsi, NEUTRAL_MACD, NEUTRAL_MACD)
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub ticker: String,
    /// Last close of the series.
    pub price: f64,
    pub bars: usize,
    pub inputs: ClassifierInputs,
    pub signal: Signal,
    pub record_id: i64,
    pub snapshot: IndicatorSnapshot,
    /// Stored records for the ticker, newest first, including this one.
    pub history: Vec<SignalRecord>,
}

/// Check bars are strictly increasing in time.
pub fn validate_series(bars: &[PriceBar]) -> Result<()> {
    match bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(AppError::UnorderedSeries { index: i + 1 }),
        None => Ok(()),
    }
}

/// Apply the warm-up policy and pick the classifier inputs.
pub fn decide(snapshot: &IndicatorSnapshot, policy: WarmUpPolicy) -> Result<ClassifierInputs> {
    if let Err(e) = snapshot.check_warm_up() {
        match policy {
            WarmUpPolicy::Reject => return Err(e),
            WarmUpPolicy::NeutralDefaults => {
                warn!("{}; using neutral indicator values", e);
            }
        }
    }

    Ok(ClassifierInputs::with_neutral_defaults(snapshot))
}

/// Runs evaluations against one fetcher and one ledger.
pub struct Evaluator<F> {
    fetcher: F,
    engine: IndicatorEngine,
    store: SignalStore,
    policy: WarmUpPolicy,
    history_limit: usize,
}

impl<F: SeriesFetcher> Evaluator<F> {
    /// Create an evaluator with default indicators, neutral warm-up defaults
    /// and a 50-row history.
    pub fn new(fetcher: F, store: SignalStore) -> Self {
        Self {
            fetcher,
            engine: IndicatorEngine::default(),
            store,
            policy: WarmUpPolicy::default(),
            history_limit: 50,
        }
    }

    pub fn from_config(fetcher: F, config: &Config) -> Self {
        let store = SignalStore::new(&config.db_path)
            .with_busy_timeout(Duration::from_millis(config.busy_timeout_ms));
        let policy = if config.strict_warm_up {
            WarmUpPolicy::Reject
        } else {
            WarmUpPolicy::NeutralDefaults
        };

        Self {
            fetcher,
            engine: IndicatorEngine::from_config(&config.indicators),
            store,
            policy,
            history_limit: config.history_limit,
        }
    }

    pub fn with_policy(mut self, policy: WarmUpPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    /// Evaluate one ticker and record the result.
    ///
    /// An empty series fails with `EmptySeries` before any indicator runs.
    /// Storage failures are returned as-is.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation> {
        let bars = self
            .fetcher
            .fetch_series(&request.ticker, request.period, request.interval)
            .await?;

        let Some(last) = bars.last() else {
            return Err(AppError::EmptySeries {
                ticker: request.ticker.clone(),
            });
        };
        let price = last.close;
        validate_series(&bars)?;

        let snapshot = self.engine.snapshot(&bars);
        let inputs = decide(&snapshot, self.policy)?;
        let signal = inputs.classify();

        let record_id = self.store.append(&NewSignalRecord::new(
            request.ticker.clone(),
            price,
            inputs.rsi,
            inputs.macd_main,
            signal,
        ))?;

        info!(
            "{} {} over {} bars: RSI {:.2}, MACD {:.4}/{:.4}",
            request.ticker,
            signal,
            bars.len(),
            inputs.rsi,
            inputs.macd_main,
            inputs.macd_signal
        );

        let history = self.store.recent_for(&request.ticker, self.history_limit)?;

        Ok(Evaluation {
            ticker: request.ticker.clone(),
            price,
            bars: bars.len(),
            inputs,
            signal,
            record_id,
            snapshot,
            history,
        })
    }
}
