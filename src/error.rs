use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Insufficient data: need {required} bars for a defined value, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("No price data for {ticker}")]
    EmptySeries { ticker: String },

    #[error("Price series is not strictly increasing in time at bar {index}")]
    UnorderedSeries { index: usize },

    #[error("Storage write failed: {0}")]
    StorageWrite(#[source] rusqlite::Error),

    #[error("Storage read failed: {0}")]
    StorageRead(#[source] rusqlite::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the failure came from the signal ledger.
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::StorageWrite(_) | AppError::StorageRead(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
