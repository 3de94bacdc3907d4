use chrono::Utc;
use uuid::Uuid;

use learnfeed_common::{Resource, ResourceKind};
use learnfeed_store::testutil::pg_container;
use learnfeed_store::{ResourceStore, StoreError};

fn new_resource(url: &str) -> Resource {
    let now = Utc::now();
    Resource {
        id: Uuid::new_v4(),
        kind: ResourceKind::BlogPost,
        title: "Title".to_string(),
        description: None,
        url: url.to_string(),
        source_id: None,
        published_date: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn add_rejects_duplicate_url() {
    let (_container, pool) = pg_container().await;
    let store = ResourceStore::new(pool);

    let first = new_resource("https://example.com/a");
    store.add(&first).await.unwrap();

    let second = new_resource("https://example.com/a");
    let err = store.add(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateUrl(_)));

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn exists_by_url_reflects_store_state() {
    let (_container, pool) = pg_container().await;
    let store = ResourceStore::new(pool);

    assert!(!store.exists_by_url("https://example.com/a").await.unwrap());
    store.add(&new_resource("https://example.com/a")).await.unwrap();
    assert!(store.exists_by_url("https://example.com/a").await.unwrap());
}

#[tokio::test]
async fn get_by_ids_returns_only_matching_rows() {
    let (_container, pool) = pg_container().await;
    let store = ResourceStore::new(pool);

    let a = new_resource("https://example.com/a");
    let b = new_resource("https://example.com/b");
    store.add(&a).await.unwrap();
    store.add(&b).await.unwrap();

    let found = store.get_by_ids(&[a.id]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, a.id);

    assert!(store.get_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_by_kind_filters_by_created_at_and_kind() {
    let (_container, pool) = pg_container().await;
    let store = ResourceStore::new(pool);

    let now = Utc::now();
    let mut recent = new_resource("https://example.com/recent");
    recent.created_at = now;
    let mut stale = new_resource("https://example.com/stale");
    stale.created_at = now - chrono::Duration::days(200);
    let mut wrong_kind = new_resource("https://example.com/video");
    wrong_kind.kind = ResourceKind::Video;

    store.add(&recent).await.unwrap();
    store.add(&stale).await.unwrap();
    store.add(&wrong_kind).await.unwrap();

    let results = store
        .recent_by_kind(ResourceKind::BlogPost, now - chrono::Duration::days(90))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, recent.id);
}
