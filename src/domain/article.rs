use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// A normalized entry produced by a mapper during one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Epoch milliseconds.
    pub published_at: i64,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_logo_url: Option<String>,
}

impl Article {
    pub fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.published_at)
    }
}

/// Cut `text` to at most `max` characters, replacing the tail with `...`.
///
/// Counts `char`s, not bytes. Idempotent: a string already within `max`
/// comes back unchanged.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn truncate_title(title: &str) -> String {
    truncate(title, MAX_TITLE_CHARS)
}

pub fn truncate_description(description: &str) -> String {
    truncate(description, MAX_DESCRIPTION_CHARS)
}
