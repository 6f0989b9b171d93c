use actix_web::{ResponseError, http::StatusCode};
use thiserror::Error;

/// Failures raised by the rate service, its engines and its stores.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Exchange rate for this currency pair and effective date already exists.")]
    DuplicateRecord,

    #[error("Exchange rate not found for ID: {0}")]
    NotFound(i64),

    #[error("Cannot {0} exchange rate for past effective dates.")]
    PastEffectiveDate(&'static str),

    #[error("No historical data available for the specified currency pair.")]
    NoHistoricalData,

    #[error(
        "Not enough historical data to calculate future rates: need {required}, have {actual}."
    )]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Historical effective dates have zero variance; the trend is undefined.")]
    DegenerateRegression,

    #[error("Invalid exchange rate: {0}")]
    InvalidRecord(String),

    /// The store refused a write; the client sees it as a bad request.
    #[error("Exchange rate rejected by store: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RateError>;

impl ResponseError for RateError {
    fn status_code(&self) -> StatusCode {
        match self {
            RateError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
