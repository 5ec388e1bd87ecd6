use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{FeedError, Result};
use crate::config::PollConfig;
use crate::fetcher::Fetcher;

pub struct HttpFetcher {
    client: Client,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &PollConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            timeout_ms: config.fetch_timeout_ms,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FeedError {
        if error.is_timeout() {
            FeedError::Timeout(self.timeout_ms)
        } else {
            FeedError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        if body.trim().is_empty() {
            return Err(FeedError::EmptyBody);
        }

        Ok(body)
    }
}
