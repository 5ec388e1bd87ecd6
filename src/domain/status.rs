use serde::{Deserialize, Serialize};

/// Persisted key names shared by the engine and the configuration surfaces.
pub mod keys {
    pub const RSS_FEEDS: &str = "rssFeeds";
    pub const SELECTED_FEEDS: &str = "selectedFeeds";
    pub const REFRESH_INTERVAL_MIN: &str = "refreshIntervalMin";
    pub const CACHED_ARTICLES: &str = "cachedArticles";
    pub const LAST_UPDATED_AT: &str = "lastUpdatedAt";
    pub const IS_OFFLINE: &str = "isOffline";
}

pub const DEFAULT_REFRESH_INTERVAL_MIN: u64 = 15;

/// What the most recent poll cycle observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    /// Epoch milliseconds, `None` before the first completed cycle.
    pub last_updated_at: Option<i64>,
    pub is_offline: bool,
}
