use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rule set: {0}")]
    InvalidRules(String),

    #[error("Unknown incident category: {0}")]
    UnknownCategory(String),

    #[error("Dispatch blocked: {0}")]
    DispatchBlocked(String),

    #[error("Transcript feed closed")]
    FeedClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TriageResult<T> = Result<T, TriageError>;
