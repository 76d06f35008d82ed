use thiserror::Error;

/// Failures raised by the upstream indicator/signal provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Insufficient data for {symbol}: {available} bars (need {required})")]
    InsufficientData {
        symbol: String,
        available: usize,
        required: usize,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
