use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Hand detector produced no frame within {0:?}")]
    DetectorTimeout(Duration),

    #[error("Frame source disconnected")]
    SourceDisconnected,
}

pub type GestureResult<T> = Result<T, GestureError>;
