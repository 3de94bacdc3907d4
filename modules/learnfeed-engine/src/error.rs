/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] learnfeed_store::StoreError),

    #[error(transparent)]
    Vector(#[from] learnfeed_vector::VectorError),

    #[error(transparent)]
    Embed(#[from] learnfeed_embed::EmbedError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
