//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Throttle error: {0}")]
    Throttle(#[from] stockfeed_throttle::ThrottleError),

    #[error("Streaming error: {0}")]
    Ws(#[from] stockfeed_ws::WsError),
}

pub type AppResult<T> = Result<T, AppError>;
