//! # Headliner
//!
//! A feed-polling engine that turns a configurable set of RSS/Atom feeds
//! into one normalized, periodically refreshed article cache.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → Poller → ParallelFetcher → MapperRegistry → Aggregator → Store
//! ```
//!
//! A timer tick or a change to the feed selection starts a poll cycle. Every
//! selected feed is fetched concurrently, routed to a mapper, and the merged
//! result replaces the cached articles unless every feed came back empty.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add and select a feed
//! headliner feed add bbc-news https://feeds.bbci.co.uk/news/rss.xml --name BBC --select
//!
//! # Poll once
//! headliner poll
//!
//! # Keep polling every 15 minutes
//! headliner run --interval 15m
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, mapper registry, and poller.
pub mod app;

/// Configuration file handling.
///
/// Loads from `~/.config/headliner/config.toml`.
pub mod config;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models: [`Feed`](domain::Feed), [`Article`](domain::Article),
/// and the persisted key names.
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for retrieving one document
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::ParallelFetcher): Concurrent fetch and map with a semaphore
pub mod fetcher;

/// Feed parsing into [`Article`](domain::Article)s.
///
/// Generic RSS and Atom mappers plus publisher-specific ones, chosen by
/// [`MapperRegistry`](mapper::MapperRegistry).
pub mod mapper;

/// Merge, order, and persist one cycle's results.
pub mod aggregator;

/// One poll cycle from configuration to cache.
pub mod poller;

/// Timer and change-driven poll scheduling.
pub mod scheduler;

/// Key-value persistence with change notification.
///
/// - [`Store`](store::Store): Trait defining the contract
/// - [`MemoryStore`](store::MemoryStore): In-process implementation
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
