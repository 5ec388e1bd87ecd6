pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::FeedError;

pub use http_fetcher::HttpFetcher;
pub use parallel::ParallelFetcher;

/// Retrieves one feed document.
///
/// Implementations never panic on network trouble: every transport, status,
/// timeout, or empty-body condition comes back as a [`FeedError`].
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;
}
