//! Source Store (§6): core reads only — writes come from the (out-of-scope)
//! HTTP API.

use sqlx::PgPool;
use uuid::Uuid;

use learnfeed_common::{ResourceKind, Source};

use crate::error::{Result, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct SourceRow {
    id: Uuid,
    owner_user_id: Uuid,
    name: String,
    url: String,
    category: String,
    is_active: bool,
}

impl TryFrom<SourceRow> for Source {
    type Error = StoreError;

    fn try_from(row: SourceRow) -> Result<Self> {
        let category = row
            .category
            .parse::<ResourceKind>()
            .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?;
        Ok(Source {
            id: row.id,
            owner_user_id: row.owner_user_id,
            name: row.name,
            url: row.url,
            category,
            is_active: row.is_active,
        })
    }
}

#[derive(Clone)]
pub struct SourceStore {
    pool: PgPool,
}

impl SourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_active(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT id, owner_user_id, name, url, category, is_active FROM sources WHERE is_active = true ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Source::try_from).collect()
    }
}
