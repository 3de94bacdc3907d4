//! Vote Store (§4.6 read side): votes with their referenced resource eagerly
//! loaded, since both the Profile Builder and the Engine need `source_id`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use learnfeed_common::{Polarity, Resource, ResourceKind, Vote, VoteWithResource};

use crate::error::{Result, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct VoteJoinRow {
    vote_id: Uuid,
    user_id: Uuid,
    resource_id: Uuid,
    polarity: i32,
    vote_created_at: DateTime<Utc>,
    res_kind: String,
    res_title: String,
    res_description: Option<String>,
    res_url: String,
    res_source_id: Option<Uuid>,
    res_published_date: Option<NaiveDate>,
    res_created_at: DateTime<Utc>,
    res_updated_at: DateTime<Utc>,
}

impl TryFrom<VoteJoinRow> for VoteWithResource {
    type Error = StoreError;

    fn try_from(row: VoteJoinRow) -> Result<Self> {
        let polarity = Polarity::from_i32(row.polarity).ok_or_else(|| {
            StoreError::Other(anyhow::anyhow!(
                "unknown vote polarity value {} for vote {}",
                row.polarity,
                row.vote_id
            ))
        })?;
        let kind = row
            .res_kind
            .parse::<ResourceKind>()
            .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?;

        Ok(VoteWithResource {
            vote: Vote {
                id: row.vote_id,
                user_id: row.user_id,
                resource_id: row.resource_id,
                polarity,
                created_at: row.vote_created_at,
            },
            resource: Resource {
                id: row.resource_id,
                kind,
                title: row.res_title,
                description: row.res_description,
                url: row.res_url,
                source_id: row.res_source_id,
                published_date: row.res_published_date,
                created_at: row.res_created_at,
                updated_at: row.res_updated_at,
            },
        })
    }
}

#[derive(Clone)]
pub struct VoteStore {
    pool: PgPool,
}

impl VoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All votes for `user_id`, each with its resource eagerly loaded.
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Vec<VoteWithResource>> {
        let rows = sqlx::query_as::<_, VoteJoinRow>(
            r#"
            SELECT
                v.id AS vote_id, v.user_id, v.resource_id, v.polarity, v.created_at AS vote_created_at,
                r.kind AS res_kind, r.title AS res_title, r.description AS res_description,
                r.url AS res_url, r.source_id AS res_source_id, r.published_date AS res_published_date,
                r.created_at AS res_created_at, r.updated_at AS res_updated_at
            FROM votes v
            JOIN resources r ON r.id = v.resource_id
            WHERE v.user_id = $1
            ORDER BY v.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VoteWithResource::try_from).collect()
    }
}
