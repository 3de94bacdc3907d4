use ai_client::{EmbedAgent, OpenAi};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{EmbedError, Result};
use crate::normalize::l2_normalize;

/// Narrow seam over the provider's batch embedding call so tests can
/// substitute a fake backend.
#[async_trait]
pub trait EmbedBackend: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
impl EmbedBackend for OpenAi {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        EmbedAgent::embed_batch(self, texts.to_vec()).await
    }
}

/// A single text to embed, paired with its resource title so an empty text
/// can fall back to something meaningful (§4.3).
#[derive(Debug, Clone)]
pub struct EmbedItem {
    pub text: String,
    pub title: String,
}

impl EmbedItem {
    pub fn new(text: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: title.into(),
        }
    }

    fn effective_text(&self) -> &str {
        if self.text.trim().is_empty() {
            &self.title
        } else {
            &self.text
        }
    }
}

pub struct EmbeddingClient<B: EmbedBackend> {
    backend: B,
    dimension: usize,
    batch_max: usize,
}

impl<B: EmbedBackend> EmbeddingClient<B> {
    pub fn new(backend: B, dimension: usize, batch_max: usize) -> Self {
        Self {
            backend,
            dimension,
            batch_max,
        }
    }

    /// Produce unit-normalized, fixed-dimension vectors for `items`, batched
    /// to `batch_max` requests, preserving input order (§4.3).
    pub async fn embed_batch(&self, items: &[EmbedItem]) -> Result<Vec<Vec<f32>>> {
        if items.is_empty() {
            return Err(EmbedError::InvalidInput(
                "embed_batch called with an empty item list".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(items.len());
        for chunk in items.chunks(self.batch_max) {
            let texts: Vec<String> = chunk.iter().map(|i| i.effective_text().to_string()).collect();
            debug!(batch_len = texts.len(), "requesting embedding batch");

            let vectors = self
                .backend
                .embed_batch(&texts)
                .await
                .map_err(|e| EmbedError::ProviderError(e.to_string()))?;

            if vectors.len() != texts.len() {
                warn!(
                    expected = texts.len(),
                    got = vectors.len(),
                    "embedding provider returned a mismatched batch size"
                );
                return Err(EmbedError::ProviderError(format!(
                    "provider returned {} vectors for {} inputs",
                    vectors.len(),
                    texts.len()
                )));
            }

            for mut v in vectors {
                if v.len() != self.dimension {
                    return Err(EmbedError::DimensionMismatch {
                        expected: self.dimension,
                        actual: v.len(),
                    });
                }
                l2_normalize(&mut v);
                out.push(v);
            }
        }

        Ok(out)
    }

    pub async fn embed_one(&self, item: EmbedItem) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&item)).await?;
        Ok(vectors.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedBackend {
        dim: usize,
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EmbedBackend for FixedBackend {
        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls.lock().unwrap().push(texts.to_vec());
            Ok(texts.iter().map(|_| vec![3.0f32; self.dim]).collect())
        }
    }

    #[tokio::test]
    async fn embed_batch_unit_normalizes_output() {
        let backend = FixedBackend {
            dim: 3,
            calls: Mutex::new(Vec::new()),
        };
        let client = EmbeddingClient::new(backend, 3, 100);
        let items = vec![EmbedItem::new("hello", "Hello")];
        let vectors = client.embed_batch(&items).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_falls_back_to_title() {
        let backend = FixedBackend {
            dim: 2,
            calls: Mutex::new(Vec::new()),
        };
        let client = EmbeddingClient::new(backend, 2, 100);
        let items = vec![EmbedItem::new("", "Fallback Title")];
        client.embed_batch(&items).await.unwrap();
        let calls = client.backend.calls.lock().unwrap();
        assert_eq!(calls[0][0], "Fallback Title");
    }

    #[tokio::test]
    async fn empty_item_list_is_invalid_input() {
        let backend = FixedBackend {
            dim: 2,
            calls: Mutex::new(Vec::new()),
        };
        let client = EmbeddingClient::new(backend, 2, 100);
        let err = client.embed_batch(&[]).await.unwrap_err();
        assert!(matches!(err, EmbedError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn respects_batch_max_by_chunking_requests() {
        let backend = FixedBackend {
            dim: 2,
            calls: Mutex::new(Vec::new()),
        };
        let client = EmbeddingClient::new(backend, 2, 2);
        let items: Vec<EmbedItem> = (0..5).map(|i| EmbedItem::new(format!("t{i}"), "T")).collect();
        let vectors = client.embed_batch(&items).await.unwrap();
        assert_eq!(vectors.len(), 5);
        let calls = client.backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[2].len(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_reported() {
        let backend = FixedBackend {
            dim: 3,
            calls: Mutex::new(Vec::new()),
        };
        let client = EmbeddingClient::new(backend, 1536, 100);
        let items = vec![EmbedItem::new("hello", "Hello")];
        let err = client.embed_batch(&items).await.unwrap_err();
        assert!(matches!(err, EmbedError::DimensionMismatch { .. }));
    }
}
