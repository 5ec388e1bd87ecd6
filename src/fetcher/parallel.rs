use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::aggregator::FeedOutcome;
use crate::app::FeedError;
use crate::domain::{Article, Feed};
use crate::fetcher::Fetcher;
use crate::mapper::MapperRegistry;

pub const DEFAULT_WORKERS: usize = 10;

/// Fetches and maps many feeds concurrently, one outcome per feed.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    registry: Arc<MapperRegistry>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, registry: Arc<MapperRegistry>) -> Self {
        Self::with_workers(fetcher, registry, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        registry: Arc<MapperRegistry>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            registry,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Waits for every feed, successful or not. Outcomes keep the input order.
    pub async fn fetch_all(&self, feeds: Vec<Feed>) -> Vec<FeedOutcome> {
        let mut handles = Vec::with_capacity(feeds.len());

        for feed in feeds {
            let fetcher = self.fetcher.clone();
            let registry = self.registry.clone();
            let semaphore = self.semaphore.clone();
            let task_feed = feed.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Err(FeedError::Transport("fetch pool closed".into())),
                };
                fetch_single_feed(fetcher.as_ref(), &registry, &task_feed).await
            });

            handles.push((feed, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (feed, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Task join error for {}: {}", feed.id, e);
                    Err(FeedError::Transport(format!("fetch task failed: {}", e)))
                }
            };

            match &result {
                Ok(articles) => tracing::info!(
                    "Parsed {} articles from {} ({})",
                    articles.len(),
                    feed.display_name(),
                    feed.id
                ),
                Err(e) => tracing::warn!(
                    "Failed to fetch feed {} ({}): {}",
                    feed.display_name(),
                    feed.id,
                    e
                ),
            }

            outcomes.push(FeedOutcome { feed, result });
        }

        outcomes
    }
}

async fn fetch_single_feed(
    fetcher: &(dyn Fetcher + Send + Sync),
    registry: &MapperRegistry,
    feed: &Feed,
) -> Result<Vec<Article>, FeedError> {
    tracing::debug!("Fetching feed: {} ({})", feed.display_name(), feed.id);
    let body = fetcher.fetch(&feed.url).await?;
    registry.parse(&feed.id, &body, feed.logo_override())
}
