use std::env;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres (Resource/Vote/Recommendation stores + pgvector index)
    pub database_url: String,

    // LLM / embedding provider (OpenAI-compatible)
    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub embedding_batch_max: usize,

    // Content Fetcher (4.1)
    pub fetch_timeout_secs: u64,
    pub fetch_max_bytes: usize,

    // Ingestion Job (4.10)
    pub source_batch_size: usize,
    pub source_deadline_secs: u64,

    // Feed Generation Job (4.12)
    pub feed_count_per_type: usize,
    pub recency_window_days: i64,
    pub recent_recommendation_window_days: i64,

    // Recommendation Engine weights (4.8, open question resolved in SPEC_FULL §9)
    pub vector_weight: f64,
    pub heuristic_weight: f64,
    pub source_pref_weight: f64,
    pub recency_weight: f64,
    pub vote_sentiment_weight: f64,
    pub diversity_cap_per_source: usize,
    pub diversity_penalties: [f64; 3],

    // Scheduler / Worker Loop (4.13)
    pub scheduler_tick_secs: u64,
    pub ingestion_interval_hours: i64,
    pub feed_generation_hour_utc: u32,
    pub run_on_startup: bool,
}

impl Config {
    /// Load configuration for the worker binary (scheduler, ingestion, feed,
    /// reindex subcommands all share this one constructor — there is only
    /// one process in this system).
    pub fn worker_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            llm_api_key: required_env("LLM_API_KEY"),
            llm_base_url: env::var("LLM_BASE_URL").ok(),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimension: env_parse("EMBEDDING_DIMENSION", 1536),
            embedding_batch_max: env_parse("EMBEDDING_BATCH_MAX", 100),

            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS", 30),
            fetch_max_bytes: env_parse("FETCH_MAX_BYTES", 2_000_000),

            source_batch_size: env_parse("SOURCE_BATCH_SIZE", 5),
            source_deadline_secs: env_parse("SOURCE_DEADLINE_SECS", 120),

            feed_count_per_type: env_parse("FEED_COUNT_PER_TYPE", 10),
            recency_window_days: env_parse("RECENCY_WINDOW_DAYS", 90),
            recent_recommendation_window_days: env_parse("RECENT_RECOMMENDATION_WINDOW_DAYS", 7),

            vector_weight: env_parse("VECTOR_WEIGHT", 0.7),
            heuristic_weight: env_parse("HEURISTIC_WEIGHT", 0.3),
            source_pref_weight: env_parse("SOURCE_PREF_WEIGHT", 0.5),
            recency_weight: env_parse("RECENCY_WEIGHT", 0.3),
            vote_sentiment_weight: env_parse("VOTE_SENTIMENT_WEIGHT", 0.2),
            diversity_cap_per_source: env_parse("DIVERSITY_CAP_PER_SOURCE", 3),
            diversity_penalties: [0.02, 0.04, 0.05],

            scheduler_tick_secs: env_parse("SCHEDULER_TICK_SECS", 60),
            ingestion_interval_hours: env_parse("INGESTION_INTERVAL_HOURS", 24),
            feed_generation_hour_utc: env_parse("FEED_GENERATION_HOUR_UTC", 2),
            run_on_startup: env::var("RUN_ON_STARTUP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Log the presence (never the value) of sensitive env-derived fields.
    pub fn log_redacted(&self) {
        let vars = [
            ("DATABASE_URL", &self.database_url),
            ("LLM_API_KEY", &self.llm_api_key),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
