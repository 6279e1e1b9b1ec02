use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RfrError {
    #[error("Invalid period: end date {end} must be after start date {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Invalid lookback: {0} (must be at least 1 business day)")]
    InvalidLookback(i64),

    #[error(
        "Insufficient history: rates do not go back {lookback} business days before {date} \
         (earliest business day is {earliest})"
    )]
    InsufficientHistory {
        date: NaiveDate,
        lookback: u32,
        earliest: NaiveDate,
    },

    #[error("Missing rate: no rate supplied for observation date {0}")]
    MissingRate(NaiveDate),

    #[error("No business day on or before {date} in the supplied rates (series starts {earliest})")]
    NoPriorBusinessDay { date: NaiveDate, earliest: NaiveDate },

    #[error("No business day on or after {date} in the supplied rates (series ends {latest})")]
    NoSubsequentBusinessDay { date: NaiveDate, latest: NaiveDate },

    #[error("{0} is not a business day in the supplied rates")]
    NotABusinessDay(NaiveDate),

    #[error("No rates provided")]
    EmptyRateSeries,

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RfrError {
    fn from(e: serde_json::Error) -> Self {
        RfrError::SerializationError(e.to_string())
    }
}
