/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("transport error calling LLM extraction backend: {0}")]
    TransportError(String),

    #[error("authentication failed against LLM extraction backend: {0}")]
    AuthError(String),

    #[error("could not parse LLM response as extraction JSON: {0}")]
    ParseError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
