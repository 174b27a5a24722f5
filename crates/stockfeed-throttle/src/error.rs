//! Throttler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("Invalid throttle configuration: {0}")]
    InvalidConfig(String),
}

pub type ThrottleResult<T> = Result<T, ThrottleError>;
