use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{HeadlinerError, Result};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher, ParallelFetcher};
use crate::mapper::MapperRegistry;
use crate::poller::Poller;
use crate::scheduler::{self, SchedulerHandle};
use crate::store::{SqliteStore, Store};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub poller: Arc<Poller>,
}

impl AppContext {
    /// Wire the engine against the SQLite store named by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.store.path() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.poll)?);
        let parallel_fetcher = ParallelFetcher::with_workers(
            fetcher,
            Arc::new(MapperRegistry::new()),
            config.poll.max_concurrency,
        );
        let poller = Arc::new(Poller::new(store.clone(), parallel_fetcher));

        Ok(Self {
            config,
            store,
            poller,
        })
    }

    /// Spawn a scheduler driving this context's poller.
    pub fn spawn_scheduler(&self) -> SchedulerHandle {
        scheduler::spawn(
            self.poller.clone(),
            self.store.clone(),
            self.config.poll.default_refresh_interval_min,
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| HeadlinerError::Config("Could not find data directory".into()))?;
        let headliner_dir = data_dir.join("headliner");
        std::fs::create_dir_all(&headliner_dir)?;
        Ok(headliner_dir.join("headliner.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;
    use crate::store::StoreExt;

    #[tokio::test]
    async fn test_in_memory_context_polls_nothing_when_unconfigured() {
        let ctx = AppContext::in_memory(Config::default()).unwrap();
        assert!(ctx.poller.poll_once().await.unwrap().is_none());
        assert_eq!(ctx.store.get::<bool>(keys::IS_OFFLINE).unwrap(), None);
    }

    #[test]
    fn test_store_path_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.path = dir.path().join("engine.db").display().to_string();

        let ctx = AppContext::new(config).unwrap();
        ctx.store.set(keys::SELECTED_FEEDS, &["nasa"]).unwrap();
        assert!(dir.path().join("engine.db").exists());
    }
}
