//! Reindex (§4.11): administrative rebuild of the Vector Index over every
//! resource, for use after a schema or embedding-model change. Same
//! error-isolation rules as the Ingestion Job, just over the whole table
//! instead of newly-ingested resources.

use tracing::{info, warn};

use learnfeed_common::VectorDocument;
use learnfeed_embed::{EmbedBackend, EmbedItem, EmbeddingClient};
use learnfeed_store::ResourceStore;
use learnfeed_vector::VectorIndex;

#[derive(Debug, Default)]
pub struct ReindexStats {
    pub resources_succeeded: usize,
    pub resources_failed: usize,
}

impl std::fmt::Display for ReindexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "resources_succeeded={} resources_failed={}",
            self.resources_succeeded, self.resources_failed
        )
    }
}

pub struct ReindexJob<E: EmbedBackend> {
    resource_store: ResourceStore,
    embed: EmbeddingClient<E>,
    vector_index: VectorIndex,
    chunk_size: usize,
}

impl<E: EmbedBackend> ReindexJob<E> {
    pub fn new(
        resource_store: ResourceStore,
        embed: EmbeddingClient<E>,
        vector_index: VectorIndex,
        chunk_size: usize,
    ) -> Self {
        Self {
            resource_store,
            embed,
            vector_index,
            chunk_size,
        }
    }

    /// Rebuild the index for every resource, in chunks of `chunk_size`
    /// (§4.11). `published_date` is always overwritten to `created_at` here
    /// via [`VectorIndex::upsert_forcing_published_date`], unlike the
    /// Ingestion Job's `COALESCE`d upsert, since a reindex is meant to reset
    /// the index to a known-consistent state.
    pub async fn run(&self) -> anyhow::Result<ReindexStats> {
        let resources = self.resource_store.get_all().await?;
        let mut stats = ReindexStats::default();

        for chunk in resources.chunks(self.chunk_size.max(1)) {
            let items: Vec<EmbedItem> = chunk
                .iter()
                .map(|r| EmbedItem::new(r.embedding_text(), r.title.clone()))
                .collect();

            let vectors = match self.embed.embed_batch(&items).await {
                Ok(vectors) => vectors,
                Err(err) => {
                    stats.resources_failed += chunk.len();
                    warn!(error = %err, chunk_len = chunk.len(), "reindex embedding failed for chunk");
                    continue;
                }
            };

            let docs: Vec<VectorDocument> = chunk
                .iter()
                .zip(vectors)
                .map(|(r, embedding)| VectorDocument {
                    id: r.id,
                    embedding,
                    kind: r.kind,
                    source_id: r.source_id,
                    published_date: Some(r.created_at.date_naive()),
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                    title: r.title.clone(),
                    description: r.description.clone(),
                    url: r.url.clone(),
                })
                .collect();

            match self.vector_index.upsert_forcing_published_date(&docs).await {
                Ok(report) => {
                    stats.resources_succeeded += report.succeeded.len();
                    stats.resources_failed += report.failed.len();
                    for (id, reason) in &report.failed {
                        warn!(resource_id = %id, error = %reason, "reindex upsert failed for resource");
                    }
                }
                Err(err) => {
                    stats.resources_failed += chunk.len();
                    warn!(error = %err, chunk_len = chunk.len(), "reindex upsert call failed for chunk");
                }
            }
        }

        info!(%stats, "reindex run complete");
        Ok(stats)
    }
}
