use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use learnfeed_common::{Resource, ResourceKind, VectorDocument};
use learnfeed_embed::{EmbedBackend, EmbeddingClient};
use learnfeed_engine::{EngineWeights, FeedGenerator, ProfileBuilder, RecommendationEngine};
use learnfeed_store::testutil::pg_container;
use learnfeed_store::{RecommendationStore, ResourceStore, UserStore, VoteStore};
use learnfeed_vector::VectorIndex;
use learnfeed_worker::FeedJob;

const DIMENSION: usize = 1536;

struct FixedEmbedBackend;

#[async_trait]
impl EmbedBackend for FixedEmbedBackend {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut v = vec![0.0f32; DIMENSION];
        v[0] = 1.0;
        Ok(texts.iter().map(|_| v.clone()).collect())
    }
}

fn new_resource(url: &str, created_at: chrono::DateTime<Utc>) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        kind: ResourceKind::BlogPost,
        title: "Title".to_string(),
        description: Some("Description".to_string()),
        url: url.to_string(),
        source_id: None,
        published_date: Some(created_at.date_naive()),
        created_at,
        updated_at: created_at,
    }
}

async fn index_resource(pool: &sqlx::PgPool, resource: &Resource) {
    let index = VectorIndex::new(pool.clone(), DIMENSION);
    let mut embedding = vec![0.0f32; DIMENSION];
    embedding[0] = 1.0;
    index
        .upsert(&[VectorDocument {
            id: resource.id,
            embedding,
            kind: resource.kind,
            source_id: resource.source_id,
            published_date: resource.published_date,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
            title: resource.title.clone(),
            description: resource.description.clone(),
            url: resource.url.clone(),
        }])
        .await
        .unwrap();
}

async fn seed_user(pool: &sqlx::PgPool, user_id: Uuid) {
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
        .bind(user_id)
        .bind(format!("{user_id}@example.com"))
        .execute(pool)
        .await
        .unwrap();
}

fn feed_job(pool: sqlx::PgPool, count_per_type: usize) -> FeedJob<FixedEmbedBackend> {
    let resource_store = ResourceStore::new(pool.clone());
    let vote_store = VoteStore::new(pool.clone());
    let recommendation_store = RecommendationStore::new(pool.clone());
    let user_store = UserStore::new(pool.clone());
    let vector_index = VectorIndex::new(pool, DIMENSION);

    let embed_client = EmbeddingClient::new(FixedEmbedBackend, DIMENSION, 100);
    let profile_builder = ProfileBuilder::new(vote_store.clone(), embed_client);
    let engine = RecommendationEngine::new(vector_index, resource_store, EngineWeights::default());
    let generator = FeedGenerator::new(recommendation_store, vote_store, profile_builder, engine);

    FeedJob::new(user_store, generator, count_per_type)
}

#[tokio::test]
async fn generates_recommendations_for_every_user() {
    let (_container, pool) = pg_container().await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    seed_user(&pool, user_a).await;
    seed_user(&pool, user_b).await;

    let resource_store = ResourceStore::new(pool.clone());
    let today = Utc::now();
    for i in 0..5 {
        let resource = new_resource(&format!("https://example.com/{i}"), today - chrono::Duration::days(i));
        resource_store.add(&resource).await.unwrap();
        index_resource(&pool, &resource).await;
    }

    let job = feed_job(pool.clone(), 5);
    let stats = job.run(today.date_naive()).await.unwrap();

    assert_eq!(stats.users_processed, 2);
    assert_eq!(stats.recommendations_written, 10);

    let recommendation_store = RecommendationStore::new(pool);
    let recs_a = recommendation_store
        .get_by_user_date_type(user_a, today.date_naive(), ResourceKind::BlogPost)
        .await
        .unwrap();
    assert_eq!(recs_a.len(), 5);
}

#[tokio::test]
async fn rerunning_for_the_same_date_is_idempotent() {
    let (_container, pool) = pg_container().await;
    let user_id = Uuid::new_v4();
    seed_user(&pool, user_id).await;

    let resource_store = ResourceStore::new(pool.clone());
    let today = Utc::now();
    for i in 0..3 {
        let resource = new_resource(&format!("https://example.com/{i}"), today - chrono::Duration::days(i));
        resource_store.add(&resource).await.unwrap();
        index_resource(&pool, &resource).await;
    }

    let job = feed_job(pool, 3);
    let date = today.date_naive();
    let first = job.run(date).await.unwrap();
    let second = job.run(date).await.unwrap();

    assert_eq!(first.recommendations_written, second.recommendations_written);
}
