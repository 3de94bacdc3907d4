//! Recommendation Store (§4.6 write side). Does not itself enforce position
//! uniqueness — invariant §3(a) is the Feed Generator's job, backed by the
//! single-replica worker assumption (§5).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use learnfeed_common::{Recommendation, ResourceKind};

use crate::error::{Result, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct RecommendationRow {
    id: Uuid,
    user_id: Uuid,
    resource_id: Uuid,
    feed_type: String,
    date: NaiveDate,
    position: i32,
    score: f64,
    generated_at: DateTime<Utc>,
}

impl TryFrom<RecommendationRow> for Recommendation {
    type Error = StoreError;

    fn try_from(row: RecommendationRow) -> Result<Self> {
        let feed_type = row
            .feed_type
            .parse::<ResourceKind>()
            .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?;
        Ok(Recommendation {
            id: row.id,
            user_id: row.user_id,
            resource_id: row.resource_id,
            feed_type,
            date: row.date,
            position: row.position,
            score: row.score,
            generated_at: row.generated_at,
        })
    }
}

#[derive(Clone)]
pub struct RecommendationStore {
    pool: PgPool,
}

impl RecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_user_date_type(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        feed_type: ResourceKind,
    ) -> Result<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            "SELECT id, user_id, resource_id, feed_type, date, position, score, generated_at \
             FROM recommendations \
             WHERE user_id = $1 AND date = $2 AND feed_type = $3 \
             ORDER BY position ASC",
        )
        .bind(user_id)
        .bind(date)
        .bind(feed_type.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Recommendation::try_from).collect()
    }

    pub async fn get_recent_by_user(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            "SELECT id, user_id, resource_id, feed_type, date, position, score, generated_at \
             FROM recommendations \
             WHERE user_id = $1 AND date BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Recommendation::try_from).collect()
    }

    pub async fn exists_for(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        feed_type: ResourceKind,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM recommendations WHERE user_id = $1 AND date = $2 AND feed_type = $3)",
        )
        .bind(user_id)
        .bind(date)
        .bind(feed_type.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn add(&self, recommendation: &Recommendation) -> Result<Recommendation> {
        let row = sqlx::query_as::<_, RecommendationRow>(
            r#"
            INSERT INTO recommendations
                (id, user_id, resource_id, feed_type, date, position, score, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, resource_id, feed_type, date, position, score, generated_at
            "#,
        )
        .bind(recommendation.id)
        .bind(recommendation.user_id)
        .bind(recommendation.resource_id)
        .bind(recommendation.feed_type.to_string())
        .bind(recommendation.date)
        .bind(recommendation.position)
        .bind(recommendation.score)
        .bind(recommendation.generated_at)
        .fetch_one(&self.pool)
        .await?;
        Recommendation::try_from(row)
    }

    /// Insert a whole batch for one `(user, date, feed_type)` call inside a
    /// single transaction, so invariant §3(a) never observes a partial write.
    pub async fn add_all(&self, recommendations: &[Recommendation]) -> Result<Vec<Recommendation>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(recommendations.len());
        for recommendation in recommendations {
            let row = sqlx::query_as::<_, RecommendationRow>(
                r#"
                INSERT INTO recommendations
                    (id, user_id, resource_id, feed_type, date, position, score, generated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, user_id, resource_id, feed_type, date, position, score, generated_at
                "#,
            )
            .bind(recommendation.id)
            .bind(recommendation.user_id)
            .bind(recommendation.resource_id)
            .bind(recommendation.feed_type.to_string())
            .bind(recommendation.date)
            .bind(recommendation.position)
            .bind(recommendation.score)
            .bind(recommendation.generated_at)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(Recommendation::try_from(row)?);
        }
        tx.commit().await?;
        Ok(inserted)
    }
}
