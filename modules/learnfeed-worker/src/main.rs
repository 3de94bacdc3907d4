use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use learnfeed_common::Config;
use learnfeed_embed::EmbeddingClient;
use learnfeed_engine::{EngineWeights, FeedGenerator, ProfileBuilder, RecommendationEngine};
use learnfeed_extract::ExtractionClient;
use learnfeed_fetch::ContentFetcher;
use learnfeed_store::{RecommendationStore, ResourceStore, SourceStore, UserStore, VoteStore};
use learnfeed_vector::VectorIndex;
use learnfeed_worker::{FeedJob, IngestionJob, ReindexJob, Scheduler};

#[derive(Parser)]
#[command(name = "learnfeed-worker", about = "Source ingestion and daily feed generation worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Ingestion Job once and exit (§4.10).
    Ingestion,
    /// Run the Feed Generation Job once and exit (§4.12).
    Feed {
        /// Civil UTC date to generate for; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rebuild the Vector Index over every resource and exit (§4.11).
    Reindex,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::worker_from_env();
    config.log_redacted();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    tracing::info!("migrations complete");

    let vector_index = VectorIndex::new(pool.clone(), config.embedding_dimension);
    vector_index.initialize().await.context("failed to initialize vector index")?;

    let resource_store = ResourceStore::new(pool.clone());
    let source_store = SourceStore::new(pool.clone());
    let user_store = UserStore::new(pool.clone());
    let vote_store = VoteStore::new(pool.clone());
    let recommendation_store = RecommendationStore::new(pool.clone());

    let llm = {
        let base = OpenAi::new(config.llm_api_key.clone(), config.llm_model.clone())
            .with_embedding_model(config.embedding_model.clone());
        match &config.llm_base_url {
            Some(base_url) => base.with_base_url(base_url.clone()),
            None => base,
        }
    };

    match cli.command {
        Some(Commands::Ingestion) => {
            let job = build_ingestion_job(&config, &llm, &source_store, &resource_store, &vector_index);
            let stats = job.run().await.context("ingestion job failed")?;
            tracing::info!(%stats, "ingestion command complete");
        }
        Some(Commands::Feed { date }) => {
            let job = build_feed_job(
                &config,
                &llm,
                &user_store,
                &vote_store,
                &recommendation_store,
                &vector_index,
                &resource_store,
            );
            let date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let stats = job.run(date).await.context("feed generation job failed")?;
            tracing::info!(%stats, "feed command complete");
        }
        Some(Commands::Reindex) => {
            let embed = EmbeddingClient::new(llm.clone(), config.embedding_dimension, config.embedding_batch_max);
            let job = ReindexJob::new(resource_store.clone(), embed, vector_index.clone(), 50);
            let stats = job.run().await.context("reindex job failed")?;
            tracing::info!(%stats, "reindex command complete");
        }
        None => {
            let ingestion_job = build_ingestion_job(&config, &llm, &source_store, &resource_store, &vector_index);
            let feed_job = build_feed_job(
                &config,
                &llm,
                &user_store,
                &vote_store,
                &recommendation_store,
                &vector_index,
                &resource_store,
            );

            let mut scheduler = Scheduler::new(
                ingestion_job,
                feed_job,
                Duration::from_secs(config.scheduler_tick_secs),
                config.ingestion_interval_hours,
                config.feed_generation_hour_utc,
                config.run_on_startup,
            );
            tracing::info!("starting scheduler loop");
            scheduler.run_forever().await.context("scheduler loop exited")?;
        }
    }

    Ok(())
}

fn build_ingestion_job(
    config: &Config,
    llm: &OpenAi,
    source_store: &SourceStore,
    resource_store: &ResourceStore,
    vector_index: &VectorIndex,
) -> IngestionJob<ContentFetcher, OpenAi, OpenAi> {
    let extraction = ExtractionClient::new(llm.clone(), Duration::from_secs(config.source_deadline_secs));
    let embed = EmbeddingClient::new(llm.clone(), config.embedding_dimension, config.embedding_batch_max);
    IngestionJob::new(
        ContentFetcher::new(config.fetch_timeout_secs, config.fetch_max_bytes),
        extraction,
        embed,
        source_store.clone(),
        resource_store.clone(),
        vector_index.clone(),
        config.source_batch_size,
        Duration::from_secs(config.source_deadline_secs),
    )
}

#[allow(clippy::too_many_arguments)]
fn build_feed_job(
    config: &Config,
    llm: &OpenAi,
    user_store: &UserStore,
    vote_store: &VoteStore,
    recommendation_store: &RecommendationStore,
    vector_index: &VectorIndex,
    resource_store: &ResourceStore,
) -> FeedJob<OpenAi> {
    let embed = EmbeddingClient::new(llm.clone(), config.embedding_dimension, config.embedding_batch_max);
    let profile_builder = ProfileBuilder::new(vote_store.clone(), embed);
    let engine = RecommendationEngine::new(vector_index.clone(), resource_store.clone(), EngineWeights::from(config));
    let generator = FeedGenerator::with_recent_window(
        recommendation_store.clone(),
        vote_store.clone(),
        profile_builder,
        engine,
        config.recent_recommendation_window_days,
    );
    FeedJob::new(user_store.clone(), generator, config.feed_count_per_type)
}
