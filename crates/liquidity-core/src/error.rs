use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiquidityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation cancelled")]
    Cancelled,

    #[error("Calculation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}
