pub mod evaluator;
pub mod signal_store;
pub mod signals;

pub use evaluator::{
    ClassifierInputs, Evaluation, EvaluationRequest, Evaluator, WarmUpPolicy, NEUTRAL_MACD,
    NEUTRAL_RSI,
};
pub use signal_store::SignalStore;
pub use signals::{classify, IndicatorEngine};
