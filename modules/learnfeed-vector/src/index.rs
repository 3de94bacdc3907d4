//! Vector Index (§4.4): vectors are mirrored directly onto the `resources`
//! row's `embedding` column rather than a separate document table — the
//! Resource row is the single source of truth (§5, shared-resources (b)),
//! and this index is just its pgvector-backed nearest-neighbor view.

use chrono::Utc;
use pgvector::Vector;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use learnfeed_common::VectorDocument;

use crate::error::{Result, VectorError};
use crate::search::{ScoredId, SearchRequest};

#[derive(Clone)]
pub struct VectorIndex {
    pool: PgPool,
    dimension: usize,
}

/// Outcome of a batch `upsert`: per-document failures are reported, not
/// propagated, so one bad vector doesn't abort the rest of the batch (§4.4).
#[derive(Debug, Default)]
pub struct UpsertReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
}

impl VectorIndex {
    pub fn new(pool: PgPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    /// Idempotently ensure the HNSW cosine index exists. Safe to call on
    /// every worker start (§4.4) — the schema itself lives in migrations,
    /// this only guards against a fresh database that hasn't run them yet
    /// having a missing index (e.g. after a `DROP INDEX` during an
    /// operability incident).
    pub async fn initialize(&self) -> Result<()> {
        sqlx::raw_sql("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::raw_sql(
            "CREATE INDEX IF NOT EXISTS resources_embedding_hnsw_idx \
             ON resources USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Batch upsert by `id`. A document whose embedding doesn't match the
    /// configured dimension, or whose row write fails, is recorded in
    /// `UpsertReport::failed` without aborting the remaining documents.
    /// `published_date` is only backfilled when absent — an existing value
    /// is left untouched (§4.10 step 5). Use [`Self::upsert_forcing_published_date`]
    /// when the caller (the Reindex job) means to reset it unconditionally.
    pub async fn upsert(&self, docs: &[VectorDocument]) -> Result<UpsertReport> {
        self.upsert_with(docs, false).await
    }

    /// Same as [`Self::upsert`], but `published_date` is always overwritten
    /// with the document's value rather than only backfilled when absent.
    /// Used by the Reindex job (§4.11), which must be able to reset
    /// `published_date` back to `created_at` even for resources that already
    /// carry a `published_date` from a prior run.
    pub async fn upsert_forcing_published_date(&self, docs: &[VectorDocument]) -> Result<UpsertReport> {
        self.upsert_with(docs, true).await
    }

    async fn upsert_with(&self, docs: &[VectorDocument], force_published_date: bool) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        for doc in docs {
            if doc.embedding.len() != self.dimension {
                report.failed.push((
                    doc.id,
                    VectorError::DimensionMismatch {
                        expected: self.dimension,
                        actual: doc.embedding.len(),
                    }
                    .to_string(),
                ));
                continue;
            }

            let vector = Vector::from(doc.embedding.clone());
            let published_date = doc.published_date.unwrap_or(doc.created_at.date_naive());

            let query = if force_published_date {
                "UPDATE resources SET embedding = $1, published_date = $2, updated_at = $3 WHERE id = $4"
            } else {
                "UPDATE resources SET embedding = $1, published_date = COALESCE(published_date, $2), updated_at = $3 \
                 WHERE id = $4"
            };

            let result = sqlx::query(query)
                .bind(&vector)
                .bind(published_date)
                .bind(Utc::now())
                .bind(doc.id)
                .execute(&self.pool)
                .await;

            match result {
                Ok(res) if res.rows_affected() == 0 => {
                    report
                        .failed
                        .push((doc.id, "no resource row with this id".to_string()));
                }
                Ok(_) => report.succeeded.push(doc.id),
                Err(err) => report.failed.push((doc.id, err.to_string())),
            }
        }
        Ok(report)
    }

    /// Remove `id` from the index (clears its embedding). Absent ids succeed
    /// silently (§4.4).
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE resources SET embedding = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Total indexed (non-null-embedding) document count.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE embedding IS NOT NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Nearest-neighbor search by cosine distance with metadata filters.
    /// `k` is a hard upper bound on the returned results; `exclude_ids` is
    /// applied in the same query, before the `LIMIT` (§4.4 invariant).
    pub async fn search(&self, req: &SearchRequest) -> Result<Vec<ScoredId>> {
        if req.query_vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: req.query_vector.len(),
            });
        }
        let query_vector = Vector::from(req.query_vector.clone());

        let mut qb = QueryBuilder::new(
            "SELECT id, (embedding <=> ",
        );
        qb.push_bind(query_vector.clone());
        qb.push(") AS distance FROM resources WHERE embedding IS NOT NULL ");

        if let Some(kind) = req.filters.kind {
            qb.push("AND kind = ");
            qb.push_bind(kind.to_string());
            qb.push(" ");
        }
        if let Some(source_ids) = &req.filters.source_id_in {
            qb.push("AND source_id = ANY(");
            qb.push_bind(source_ids.clone());
            qb.push(") ");
        }
        if let Some(since) = req.filters.published_date_gte {
            qb.push("AND published_date >= ");
            qb.push_bind(since);
            qb.push(" ");
        }
        if let Some(until) = req.filters.published_date_lte {
            qb.push("AND published_date <= ");
            qb.push_bind(until);
            qb.push(" ");
        }
        if !req.filters.exclude_ids.is_empty() {
            qb.push("AND NOT (id = ANY(");
            qb.push_bind(req.filters.exclude_ids.clone());
            qb.push(")) ");
        }

        qb.push("ORDER BY embedding <=> ");
        qb.push_bind(query_vector);
        qb.push(" LIMIT ");
        qb.push_bind(req.k as i64);

        let rows: Vec<(Uuid, f64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, distance)| ScoredId {
                id,
                score: (2.0 - distance) / 2.0,
            })
            .collect())
    }
}
