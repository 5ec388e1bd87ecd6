//! Merging per-feed results into the persisted article cache.

use crate::app::{FeedError, Result};
use crate::domain::{keys, Article, Feed};
use crate::mapper::date::now_millis;
use crate::store::{Store, StoreExt};

/// What one selected feed contributed to a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    pub feed: Feed,
    pub result: std::result::Result<Vec<Article>, FeedError>,
}

impl FeedOutcome {
    pub fn articles(&self) -> &[Article] {
        self.result.as_deref().unwrap_or(&[])
    }
}

/// The merged view of one cycle, before it is written anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub articles: Vec<Article>,
    pub attempted: usize,
    pub success_count: usize,
    pub is_offline: bool,
}

/// Flatten, order newest first, and derive the offline flag.
///
/// Equal timestamps are ordered by source id, then by the order the feed
/// itself listed the items.
pub fn aggregate(outcomes: &[FeedOutcome]) -> Aggregate {
    let success_count = outcomes
        .iter()
        .filter(|outcome| !outcome.articles().is_empty())
        .count();

    let mut articles: Vec<Article> = outcomes
        .iter()
        .flat_map(|outcome| outcome.articles().iter().cloned())
        .collect();

    // Stable, so per-feed order survives among equal keys
    articles.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });

    let with_images = articles.iter().filter(|a| a.image_url.is_some()).count();
    tracing::debug!(
        "{} of {} articles carry an image",
        with_images,
        articles.len()
    );

    Aggregate {
        articles,
        attempted: outcomes.len(),
        success_count,
        is_offline: success_count == 0 && !outcomes.is_empty(),
    }
}

/// Write the cycle's results.
///
/// An empty result leaves the previous cache in place. The cache is written
/// before the status keys that describe it.
pub fn persist<S: Store + ?Sized>(store: &S, aggregate: &Aggregate) -> Result<()> {
    if aggregate.articles.is_empty() {
        let cached: Vec<Article> = store.get_or(keys::CACHED_ARTICLES, Vec::new())?;
        tracing::info!(
            "No fresh articles, keeping {} cached articles",
            cached.len()
        );
    } else {
        store.set(keys::CACHED_ARTICLES, &aggregate.articles)?;
    }

    store.set(keys::LAST_UPDATED_AT, &now_millis())?;
    store.set(keys::IS_OFFLINE, &aggregate.is_offline)?;

    Ok(())
}
