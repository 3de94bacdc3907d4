/// Result type alias for vector index operations.
pub type Result<T> = std::result::Result<T, VectorError>;

#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
