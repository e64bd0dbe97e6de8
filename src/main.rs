use coinclerk::config::Config;
use coinclerk::error::AppError;
use coinclerk::services::{Evaluation, EvaluationRequest, Evaluator};
use coinclerk::sources::{commodity_name, resolve_ticker, YahooFinanceClient};
use coinclerk::types::{Interval, Period};
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the request from `[ticker] [interval] [period]`, falling back to
/// configured defaults.
fn parse_args<I: Iterator<Item = String>>(
    mut args: I,
    config: &Config,
) -> Result<EvaluationRequest, AppError> {
    let ticker = args
        .next()
        .map(|t| resolve_ticker(&t))
        .unwrap_or_else(|| config.default_ticker.clone());

    let interval = match args.next() {
        Some(s) => Interval::parse(&s).ok_or_else(|| {
            AppError::InvalidArgument(format!("interval {:?} (expected 1d, 1h or 1wk)", s))
        })?,
        None => config.default_interval,
    };

    let period = match args.next() {
        Some(s) => Period::parse(&s).ok_or_else(|| {
            AppError::InvalidArgument(format!("period {:?} (expected 1mo, 3mo or 6mo)", s))
        })?,
        None => config.default_period,
    };

    Ok(EvaluationRequest::new(ticker, period, interval))
}

fn print_evaluation(request: &EvaluationRequest, evaluation: &Evaluation) {
    let name = commodity_name(&evaluation.ticker)
        .map(|n| format!(" ({})", n))
        .unwrap_or_default();

    println!(
        "{}{} | {} | {} | {} bars",
        evaluation.ticker,
        name,
        request.interval.as_str(),
        request.period.as_str(),
        evaluation.bars
    );
    println!("Last close: {:.2}", evaluation.price);
    println!(
        "RSI: {:.2}   MACD: {:.4} / signal {:.4}",
        evaluation.inputs.rsi, evaluation.inputs.macd_main, evaluation.inputs.macd_signal
    );
    println!("Signal: {}", evaluation.signal);
    if evaluation.inputs.defaults_applied {
        println!("(not enough history for every indicator; neutral values used)");
    }

    println!();
    if evaluation.history.is_empty() {
        println!("No history for this ticker yet.");
        return;
    }

    println!("Signal history");
    println!(
        "{:>6}  {:<16}  {:>12}  {:>7}  {:>10}  {:<4}",
        "id", "time", "price", "rsi", "macd", "signal"
    );
    for record in &evaluation.history {
        println!(
            "{:>6}  {:<16}  {:>12.2}  {:>7.2}  {:>10.4}  {:<4}",
            record.id,
            record.display_time(),
            record.price,
            record.rsi,
            record.macd,
            record.signal
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinclerk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env();
    let request = parse_args(std::env::args().skip(1), &config)?;

    let fetcher = YahooFinanceClient::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let evaluator = Evaluator::from_config(fetcher, &config);
    evaluator.store().init()?;

    match evaluator.evaluate(&request).await {
        Ok(evaluation) => {
            print_evaluation(&request, &evaluation);
            Ok(())
        }
        Err(AppError::EmptySeries { ticker }) => {
            eprintln!(
                "Could not load data for {} - check the ticker or the time range.",
                ticker
            );
            std::process::exit(1);
        }
        Err(e) if e.is_storage() => {
            error!("Signal ledger at {} is unavailable", config.db_path.display());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
