/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedding input was invalid: {0}")]
    InvalidInput(String),

    #[error("embedding provider error: {0}")]
    ProviderError(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
