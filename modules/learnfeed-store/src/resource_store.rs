//! Resource Store (§4.5): the content-addressed persistence layer keyed by
//! `url`. Plain `sqlx` over Postgres — no ORM, per the teacher's own
//! `taproot-domains` model layer.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use learnfeed_common::{Resource, ResourceKind};

use crate::error::{Result, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct ResourceRow {
    id: Uuid,
    kind: String,
    title: String,
    description: Option<String>,
    url: String,
    source_id: Option<Uuid>,
    published_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> Result<Self> {
        let kind = row
            .kind
            .parse::<ResourceKind>()
            .map_err(|e| StoreError::Other(anyhow::anyhow!(e)))?;
        Ok(Resource {
            id: row.id,
            kind,
            title: row.title,
            description: row.description,
            url: row.url,
            source_id: row.source_id,
            published_date: row.published_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct ResourceStore {
    pool: PgPool,
}

impl ResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, kind, title, description, url, source_id, published_date, created_at, updated_at \
             FROM resources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Resource::try_from).transpose()
    }

    pub async fn get_all(&self) -> Result<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, kind, title, description, url, source_id, published_date, created_at, updated_at \
             FROM resources ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Resource::try_from).collect()
    }

    pub async fn get_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, kind, title, description, url, source_id, published_date, created_at, updated_at \
             FROM resources WHERE kind = $1 ORDER BY created_at DESC",
        )
        .bind(kind.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Resource::try_from).collect()
    }

    /// Resources of `kind` created on or after `since`, used by the Engine's
    /// cold-start fallback path and by Reindex.
    pub async fn recent_by_kind(&self, kind: ResourceKind, since: DateTime<Utc>) -> Result<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, kind, title, description, url, source_id, published_date, created_at, updated_at \
             FROM resources WHERE kind = $1 AND created_at >= $2 ORDER BY created_at DESC",
        )
        .bind(kind.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Resource::try_from).collect()
    }

    /// Batch fetch by id, used by the Recommendation Engine to load
    /// heuristic-scoring metadata (`created_at`, `source_id`) for a page of
    /// vector-search hits in one round trip.
    pub async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Resource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ResourceRow>(
            "SELECT id, kind, title, description, url, source_id, published_date, created_at, updated_at \
             FROM resources WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Resource::try_from).collect()
    }

    pub async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM resources WHERE url = $1)")
                .bind(url)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert `resource`. Fails with `DuplicateUrl` if another resource
    /// already has the same url — the pre-check/add race is tolerated by
    /// treating this as a benign skip at the caller (§4.5, §4.10 step 4).
    pub async fn add(&self, resource: &Resource) -> Result<Resource> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            INSERT INTO resources
                (id, kind, title, description, url, source_id, published_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, kind, title, description, url, source_id, published_date, created_at, updated_at
            "#,
        )
        .bind(resource.id)
        .bind(resource.kind.to_string())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.url)
        .bind(resource.source_id)
        .bind(resource.published_date)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, &resource.url))?;

        Resource::try_from(row)
    }

    /// Update mutable fields and bump `updated_at`.
    pub async fn update(&self, resource: &Resource) -> Result<Resource> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            UPDATE resources
            SET title = $2, description = $3, published_date = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, kind, title, description, url, source_id, published_date, created_at, updated_at
            "#,
        )
        .bind(resource.id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.published_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(resource.id.to_string()))?;

        Resource::try_from(row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn classify_insert_error(err: sqlx::Error, url: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::DuplicateUrl(url.to_string());
        }
    }
    StoreError::Database(err)
}
