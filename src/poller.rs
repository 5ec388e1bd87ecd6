//! One poll cycle: read the configured feeds, fetch, aggregate, persist.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::aggregator::{self, Aggregate};
use crate::app::Result;
use crate::domain::{keys, Feed};
use crate::fetcher::ParallelFetcher;
use crate::scheduler::CycleRunner;
use crate::store::{Store, StoreExt};

pub struct Poller {
    store: Arc<dyn Store>,
    fetcher: ParallelFetcher,
}

impl Poller {
    pub fn new(store: Arc<dyn Store>, fetcher: ParallelFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Configured feeds whose id is selected, in configuration order.
    pub fn selected_feeds(&self) -> Result<Vec<Feed>> {
        let feeds: Vec<Feed> = self.store.get_or(keys::RSS_FEEDS, Vec::new())?;
        let selected: Vec<String> = self.store.get_or(keys::SELECTED_FEEDS, Vec::new())?;
        let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();

        Ok(feeds
            .into_iter()
            .filter(|feed| selected.contains(feed.id.as_str()))
            .collect())
    }

    /// Run a cycle and report what it did.
    ///
    /// Returns `Ok(None)` when nothing is selected; no keys are written then.
    pub async fn poll_once(&self) -> Result<Option<Aggregate>> {
        let feeds = self.selected_feeds()?;
        if feeds.is_empty() {
            tracing::info!("No feeds selected, skipping poll");
            return Ok(None);
        }

        let start = Instant::now();
        tracing::info!("Polling {} feeds", feeds.len());

        let outcomes = self.fetcher.fetch_all(feeds).await;
        let result = aggregator::aggregate(&outcomes);
        aggregator::persist(self.store.as_ref(), &result)?;

        tracing::info!(
            "Poll complete: {} articles from {}/{} feeds{} ({:.1}s)",
            result.articles.len(),
            result.success_count,
            result.attempted,
            if result.is_offline { ", offline" } else { "" },
            start.elapsed().as_secs_f64()
        );

        Ok(Some(result))
    }
}

#[async_trait]
impl CycleRunner for Poller {
    async fn run_cycle(&self) {
        if let Err(e) = self.poll_once().await {
            tracing::error!("Poll cycle failed: {}", e);
        }
    }
}
