//! Feed Generation Job (§4.12): iterate all users and their configured feed
//! types, invoking the Feed Generator with `N` per feed type. Failures per
//! (user, feed_type) are logged by `FeedGenerator::generate_all` itself and
//! never abort the job.

use chrono::NaiveDate;
use tracing::info;

use learnfeed_embed::EmbedBackend;
use learnfeed_engine::FeedGenerator;
use learnfeed_store::UserStore;

#[derive(Debug, Default)]
pub struct FeedStats {
    pub users_processed: usize,
    pub recommendations_written: usize,
}

impl std::fmt::Display for FeedStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users_processed={} recommendations_written={}",
            self.users_processed, self.recommendations_written
        )
    }
}

pub struct FeedJob<B: EmbedBackend> {
    user_store: UserStore,
    generator: FeedGenerator<B>,
    count_per_type: usize,
}

impl<B: EmbedBackend> FeedJob<B> {
    pub fn new(user_store: UserStore, generator: FeedGenerator<B>, count_per_type: usize) -> Self {
        Self {
            user_store,
            generator,
            count_per_type,
        }
    }

    /// Generate every configured feed type for every user on `date`.
    /// Intended to be run once per civil UTC day (§4.12).
    pub async fn run(&self, date: NaiveDate) -> anyhow::Result<FeedStats> {
        let users = self.user_store.get_all().await?;
        let mut stats = FeedStats::default();

        for user in users {
            let recs = self.generator.generate_all(user.id, date, self.count_per_type).await;
            stats.users_processed += 1;
            stats.recommendations_written += recs.len();
        }

        info!(%stats, "feed generation run complete");
        Ok(stats)
    }
}
