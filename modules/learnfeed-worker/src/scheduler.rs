//! Scheduler / Worker Loop (§4.13): a single process, one scheduling loop,
//! ticking every minute. Triggers ingestion every `ingestion_interval_hours`
//! since the previous *successful* trigger, and feed generation once per
//! civil UTC day at or after `feed_generation_hour_utc` if it hasn't already
//! run that day. State lives in memory only — consistent with the
//! single-replica assumption in §5; a restart simply re-evaluates both
//! conditions from a clean slate.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Timelike, Utc};
use tracing::{info, warn};

use learnfeed_embed::EmbedBackend;
use learnfeed_extract::LlmBackend;
use learnfeed_fetch::FetchBackend;

use crate::jobs::{FeedJob, IngestionJob};

/// Delay between the two jobs in "run on startup" mode, to allow the
/// freshly-ingested resources' embeddings to become visible to the Vector
/// Index before the feed generation job retrieves candidates (§4.13).
const STARTUP_JOB_GAP: StdDuration = StdDuration::from_secs(5);

pub struct Scheduler<F: FetchBackend, L: LlmBackend, B: EmbedBackend> {
    ingestion: IngestionJob<F, L, B>,
    feed: FeedJob<B>,
    tick: StdDuration,
    ingestion_interval: ChronoDuration,
    feed_generation_hour_utc: u32,
    run_on_startup: bool,
    last_ingestion_success: Option<DateTime<Utc>>,
    last_feed_generation_date: Option<NaiveDate>,
}

impl<F: FetchBackend, L: LlmBackend, B: EmbedBackend> Scheduler<F, L, B> {
    pub fn new(
        ingestion: IngestionJob<F, L, B>,
        feed: FeedJob<B>,
        tick: StdDuration,
        ingestion_interval_hours: i64,
        feed_generation_hour_utc: u32,
        run_on_startup: bool,
    ) -> Self {
        Self {
            ingestion,
            feed,
            tick,
            ingestion_interval: ChronoDuration::hours(ingestion_interval_hours),
            feed_generation_hour_utc,
            run_on_startup,
            last_ingestion_success: None,
            last_feed_generation_date: None,
        }
    }

    /// Run the scheduling loop forever. Only returns on a fatal error from
    /// one of the jobs' own setup (neither job surfaces anything but
    /// Configuration-class errors this far up, per §7).
    pub async fn run_forever(&mut self) -> anyhow::Result<()> {
        if self.run_on_startup {
            info!("scheduler: run-on-startup enabled, triggering both jobs immediately");
            self.trigger_ingestion(Utc::now()).await;
            tokio::time::sleep(STARTUP_JOB_GAP).await;
            self.trigger_feed_generation(Utc::now().date_naive()).await;
        }

        loop {
            tokio::time::sleep(self.tick).await;
            self.tick().await;
        }
    }

    /// One evaluation of the two wall-clock conditions (§4.13). Exposed
    /// separately from `run_forever` so tests can drive it without an
    /// infinite loop.
    pub async fn tick(&mut self) {
        let now = Utc::now();

        let ingestion_due = self
            .last_ingestion_success
            .map(|last| now - last >= self.ingestion_interval)
            .unwrap_or(true);
        if ingestion_due {
            self.trigger_ingestion(now).await;
        }

        let today = now.date_naive();
        let feed_due = now.hour() >= self.feed_generation_hour_utc
            && self.last_feed_generation_date != Some(today);
        if feed_due {
            self.trigger_feed_generation(today).await;
        }
    }

    async fn trigger_ingestion(&mut self, now: DateTime<Utc>) {
        info!("scheduler: triggering ingestion job");
        match self.ingestion.run().await {
            Ok(stats) => {
                info!(%stats, "scheduler: ingestion job completed");
                self.last_ingestion_success = Some(now);
            }
            Err(err) => {
                warn!(error = %err, "scheduler: ingestion job failed, will retry next tick");
            }
        }
    }

    async fn trigger_feed_generation(&mut self, today: NaiveDate) {
        info!("scheduler: triggering feed generation job");
        match self.feed.run(today).await {
            Ok(stats) => {
                info!(%stats, "scheduler: feed generation job completed");
                self.last_feed_generation_date = Some(today);
            }
            Err(err) => {
                warn!(error = %err, "scheduler: feed generation job failed, will retry later today");
            }
        }
    }
}
