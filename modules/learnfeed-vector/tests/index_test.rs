use chrono::Utc;
use uuid::Uuid;

use learnfeed_common::{ResourceKind, VectorDocument};
use learnfeed_store::testutil::pg_container;
use learnfeed_vector::{SearchFilters, SearchRequest, VectorIndex};

fn doc(id: Uuid, kind: ResourceKind, embedding: Vec<f32>) -> VectorDocument {
    let now = Utc::now();
    VectorDocument {
        id,
        embedding,
        kind,
        source_id: None,
        published_date: Some(now.date_naive()),
        created_at: now,
        updated_at: now,
        title: "Title".to_string(),
        description: None,
        url: format!("https://example.com/{id}"),
    }
}

async fn seed_resource(pool: &sqlx::PgPool, id: Uuid, kind: ResourceKind) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO resources (id, kind, title, description, url, source_id, published_date, created_at, updated_at) \
         VALUES ($1, $2, 'Title', NULL, $3, NULL, NULL, $4, $4)",
    )
    .bind(id)
    .bind(kind.to_string())
    .bind(format!("https://example.com/{id}"))
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn identity_retrieval_after_upsert() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let id = Uuid::new_v4();
    seed_resource(&pool, id, ResourceKind::BlogPost).await;

    let embedding = vec![1.0f32, 0.0, 0.0];
    let report = index.upsert(&[doc(id, ResourceKind::BlogPost, embedding.clone())]).await.unwrap();
    assert_eq!(report.succeeded, vec![id]);
    assert!(report.failed.is_empty());

    assert_eq!(index.count().await.unwrap(), 1);

    let results = index
        .search(&SearchRequest {
            query_vector: embedding,
            k: 5,
            filters: SearchFilters::default(),
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, id);
    assert!(results[0].score > 0.99);
}

#[tokio::test]
async fn search_honors_k_and_exclude_ids() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let mut docs = Vec::new();
    for id in &ids {
        seed_resource(&pool, *id, ResourceKind::Paper).await;
        docs.push(doc(*id, ResourceKind::Paper, vec![1.0, 0.0, 0.0]));
    }
    index.upsert(&docs).await.unwrap();

    let results = index
        .search(&SearchRequest {
            query_vector: vec![1.0, 0.0, 0.0],
            k: 3,
            filters: SearchFilters::default(),
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    let results = index
        .search(&SearchRequest {
            query_vector: vec![1.0, 0.0, 0.0],
            k: 10,
            filters: SearchFilters {
                exclude_ids: vec![ids[0], ids[1]],
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(!results.iter().any(|r| r.id == ids[0] || r.id == ids[1]));
}

#[tokio::test]
async fn search_filters_by_kind() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let paper_id = Uuid::new_v4();
    let video_id = Uuid::new_v4();
    seed_resource(&pool, paper_id, ResourceKind::Paper).await;
    seed_resource(&pool, video_id, ResourceKind::Video).await;
    index
        .upsert(&[
            doc(paper_id, ResourceKind::Paper, vec![1.0, 0.0, 0.0]),
            doc(video_id, ResourceKind::Video, vec![1.0, 0.0, 0.0]),
        ])
        .await
        .unwrap();

    let results = index
        .search(&SearchRequest {
            query_vector: vec![1.0, 0.0, 0.0],
            k: 10,
            filters: SearchFilters {
                kind: Some(ResourceKind::Paper),
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, paper_id);
}

#[tokio::test]
async fn delete_clears_embedding_and_is_idempotent_on_absent_id() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let id = Uuid::new_v4();
    seed_resource(&pool, id, ResourceKind::BlogPost).await;
    index.upsert(&[doc(id, ResourceKind::BlogPost, vec![1.0, 0.0, 0.0])]).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 1);

    index.delete(id).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 0);

    // Deleting an id that was never indexed succeeds silently.
    index.delete(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn upsert_reports_dimension_mismatch_without_aborting_batch() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let good_id = Uuid::new_v4();
    let bad_id = Uuid::new_v4();
    seed_resource(&pool, good_id, ResourceKind::BlogPost).await;
    seed_resource(&pool, bad_id, ResourceKind::BlogPost).await;

    let report = index
        .upsert(&[
            doc(good_id, ResourceKind::BlogPost, vec![1.0, 0.0, 0.0]),
            doc(bad_id, ResourceKind::BlogPost, vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec![good_id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad_id);
}

#[tokio::test]
async fn upsert_backfills_published_date_only_when_absent() {
    let (_container, pool) = pg_container().await;
    let index = VectorIndex::new(pool.clone(), 3);
    index.initialize().await.unwrap();

    let id = Uuid::new_v4();
    seed_resource(&pool, id, ResourceKind::BlogPost).await;

    let original_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut first = doc(id, ResourceKind::BlogPost, vec![1.0, 0.0, 0.0]);
    first.published_date = Some(original_date);
    index.upsert(&[first]).await.unwrap();

    let stored: chrono::NaiveDate =
        sqlx::query_scalar("SELECT published_date FROM resources WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, original_date);

    // A plain upsert with a different published_date leaves the existing
    // column untouched (COALESCE).
    let mut second = doc(id, ResourceKind::BlogPost, vec![0.0, 1.0, 0.0]);
    second.published_date = Some(chrono::Utc::now().date_naive());
    index.upsert(&[second]).await.unwrap();

    let still_original: chrono::NaiveDate =
        sqlx::query_scalar("SELECT published_date FROM resources WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(still_original, original_date);

    // upsert_forcing_published_date overwrites it unconditionally (§4.11 reindex).
    let reset_date = chrono::Utc::now().date_naive();
    let mut forced = doc(id, ResourceKind::BlogPost, vec![0.0, 0.0, 1.0]);
    forced.published_date = Some(reset_date);
    index.upsert_forcing_published_date(&[forced]).await.unwrap();

    let overwritten: chrono::NaiveDate =
        sqlx::query_scalar("SELECT published_date FROM resources WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(overwritten, reset_date);
}
