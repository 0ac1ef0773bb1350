use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridcastError {
    #[error("projection error: {0}")]
    Projection(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GridcastError {
    /// True for failures a caller may recover from by trying a simpler model.
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, GridcastError::InsufficientHistory(_))
    }
}

pub type Result<T> = std::result::Result<T, GridcastError>;
