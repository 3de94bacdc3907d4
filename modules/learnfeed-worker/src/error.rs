/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Only this variant is allowed to cross a job boundary and abort the
/// process (§7): everything else is caught at the unit boundary (one
/// source, one (user, feed_type)) and logged.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
