/// Errors raised while encoding or writing records
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Subscriber error: {0}")]
    Subscriber(String),
}

pub type Result<T> = std::result::Result<T, LoggingError>;
