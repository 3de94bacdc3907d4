//! Embedding Client (§4.3): batched, order-preserving, unit-normalized text
//! embeddings over a configured fixed dimension.

pub mod client;
pub mod error;
pub mod normalize;

pub use client::{EmbedBackend, EmbedItem, EmbeddingClient};
pub use error::{EmbedError, Result};
pub use normalize::{l2_norm, l2_normalize, mean};
