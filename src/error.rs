use thiserror::Error;

/// Errors raised by the trading pipeline
///
/// Data and validation errors abort the current tick. Exchange errors on
/// leverage/order calls are caught by the execution engine and recorded per
/// action; everywhere else they abort the tick like any other error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("exchange error: {0}")]
    Exchange(String),

    #[error("decision engine error: {0}")]
    Decision(String),

    #[error("malformed decision response: {0}")]
    MalformedDecision(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// True for errors caused by bad input rather than a remote failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidGranularity(_) | Error::InvalidSchedule(_))
    }
}
