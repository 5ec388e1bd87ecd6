use chrono::{DateTime, Local, Utc};

use crate::app::{AppContext, HeadlinerError, Result};
use crate::cli::{interval_minutes, parse_interval};
use crate::domain::{keys, Article, EngineStatus, Feed, DEFAULT_REFRESH_INTERVAL_MIN};
use crate::store::StoreExt;

pub fn add_feed(ctx: &AppContext, feed: Feed, select: bool) -> Result<()> {
    let mut feeds: Vec<Feed> = ctx.store.get_or(keys::RSS_FEEDS, Vec::new())?;

    match feeds.iter_mut().find(|f| f.id == feed.id) {
        Some(existing) => {
            *existing = feed.clone();
            println!("Updated feed: {} ({})", feed.display_name(), feed.id);
        }
        None => {
            feeds.push(feed.clone());
            println!("Added feed: {} ({})", feed.display_name(), feed.id);
        }
    }
    ctx.store.set(keys::RSS_FEEDS, &feeds)?;

    if select {
        let mut selected: Vec<String> = ctx.store.get_or(keys::SELECTED_FEEDS, Vec::new())?;
        if !selected.contains(&feed.id) {
            selected.push(feed.id);
            ctx.store.set(keys::SELECTED_FEEDS, &selected)?;
        }
    }

    Ok(())
}

pub fn remove_feed(ctx: &AppContext, id: &str) -> Result<()> {
    let mut feeds: Vec<Feed> = ctx.store.get_or(keys::RSS_FEEDS, Vec::new())?;
    let before = feeds.len();
    feeds.retain(|f| f.id != id);

    if feeds.len() == before {
        return Err(HeadlinerError::FeedNotFound(id.to_string()));
    }
    ctx.store.set(keys::RSS_FEEDS, &feeds)?;

    let mut selected: Vec<String> = ctx.store.get_or(keys::SELECTED_FEEDS, Vec::new())?;
    if selected.iter().any(|s| s == id) {
        selected.retain(|s| s != id);
        ctx.store.set(keys::SELECTED_FEEDS, &selected)?;
    }

    println!("Removed feed: {}", id);
    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds: Vec<Feed> = ctx.store.get_or(keys::RSS_FEEDS, Vec::new())?;
    let selected: Vec<String> = ctx.store.get_or(keys::SELECTED_FEEDS, Vec::new())?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let marker = if selected.contains(&feed.id) { "●" } else { " " };
        println!(
            "{} {} [{}] ({})\n  {}",
            marker,
            feed.display_name(),
            feed.category,
            feed.id,
            feed.url
        );
    }

    Ok(())
}

pub fn select_feeds(ctx: &AppContext, ids: Vec<String>) -> Result<()> {
    let feeds: Vec<Feed> = ctx.store.get_or(keys::RSS_FEEDS, Vec::new())?;

    for id in &ids {
        if !feeds.iter().any(|f| &f.id == id) {
            eprintln!("Warning: no configured feed with id {}", id);
        }
    }

    ctx.store.set(keys::SELECTED_FEEDS, &ids)?;
    println!("Selected {} feeds", ids.len());
    Ok(())
}

pub fn set_interval(ctx: &AppContext, minutes: u64) -> Result<()> {
    if minutes == 0 {
        return Err(HeadlinerError::Config(
            "Refresh interval must be at least 1 minute".into(),
        ));
    }

    ctx.store.set(keys::REFRESH_INTERVAL_MIN, &minutes)?;
    println!("Refresh interval set to {} min", minutes);
    Ok(())
}

pub async fn poll(ctx: &AppContext) -> Result<()> {
    match ctx.poller.poll_once().await? {
        None => println!("No feeds selected"),
        Some(result) => {
            println!(
                "Poll complete: {} articles from {}/{} feeds",
                result.articles.len(),
                result.success_count,
                result.attempted
            );
            if result.is_offline {
                println!("All feeds failed; keeping the previous cache");
            }
        }
    }
    Ok(())
}

pub fn list_articles(ctx: &AppContext, limit: usize) -> Result<()> {
    let articles: Vec<Article> = ctx.store.get_or(keys::CACHED_ARTICLES, Vec::new())?;

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    for article in articles.iter().take(limit) {
        let date = article
            .published()
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "                ".to_string());
        let image = if article.image_url.is_some() { "▣" } else { " " };

        println!("{} {} [{}] {}", image, date, article.source_id, article.title);
        if !article.link.is_empty() {
            println!("                     {}", article.link);
        }
    }

    if articles.len() > limit {
        println!("... {} more", articles.len() - limit);
    }

    Ok(())
}

pub fn show_status(ctx: &AppContext) -> Result<()> {
    let status = EngineStatus {
        last_updated_at: ctx.store.get(keys::LAST_UPDATED_AT)?,
        is_offline: ctx.store.get_or(keys::IS_OFFLINE, false)?,
    };
    let cached: Vec<Article> = ctx.store.get_or(keys::CACHED_ARTICLES, Vec::new())?;
    let interval = ctx
        .store
        .get_raw(keys::REFRESH_INTERVAL_MIN)?
        .and_then(|v| crate::scheduler::interval_from_value(&v))
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_MIN);

    let last_updated = status
        .last_updated_at
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("Last updated: {}", last_updated);
    println!("Offline:      {}", if status.is_offline { "yes" } else { "no" });
    println!("Cached:       {} articles", cached.len());
    println!("Interval:     {} min", interval);
    Ok(())
}

/// Run the scheduler until Ctrl-C or SIGTERM.
pub async fn run(ctx: &AppContext, interval: Option<&str>) -> Result<()> {
    if let Some(interval) = interval {
        let secs = parse_interval(interval).map_err(HeadlinerError::Config)?;
        ctx.store
            .set(keys::REFRESH_INTERVAL_MIN, &interval_minutes(secs))?;
    }

    let scheduler = ctx.spawn_scheduler();
    scheduler
        .start()
        .await
        .map_err(|e| HeadlinerError::Other(e.to_string()))?;

    println!("Headliner running (PID: {}), press Ctrl-C to stop", std::process::id());
    shutdown_signal().await?;

    println!("Shutting down...");
    scheduler
        .stop()
        .await
        .map_err(|e| HeadlinerError::Other(e.to_string()))?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn ctx() -> AppContext {
        AppContext::in_memory(Config::default()).unwrap()
    }

    #[test]
    fn test_add_feed_replaces_same_id() {
        let ctx = ctx();
        add_feed(&ctx, Feed::new("cnn", "CNN", "http://rss.cnn.com/rss/edition.rss"), true).unwrap();
        add_feed(&ctx, Feed::new("cnn", "CNN World", "http://rss.cnn.com/rss/edition_world.rss"), true)
            .unwrap();

        let feeds: Vec<Feed> = ctx.store.get(keys::RSS_FEEDS).unwrap().unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "CNN World");

        let selected: Vec<String> = ctx.store.get(keys::SELECTED_FEEDS).unwrap().unwrap();
        assert_eq!(selected, vec!["cnn"]);
    }

    #[test]
    fn test_remove_feed_deselects() {
        let ctx = ctx();
        add_feed(&ctx, Feed::new("nasa", "NASA", "https://www.nasa.gov/feed/"), true).unwrap();
        remove_feed(&ctx, "nasa").unwrap();

        let selected: Vec<String> = ctx.store.get(keys::SELECTED_FEEDS).unwrap().unwrap();
        assert!(selected.is_empty());
        assert!(matches!(
            remove_feed(&ctx, "nasa"),
            Err(HeadlinerError::FeedNotFound(_))
        ));
    }

    #[test]
    fn test_set_interval_rejects_zero() {
        let ctx = ctx();
        assert!(set_interval(&ctx, 0).is_err());
        set_interval(&ctx, 30).unwrap();
        assert_eq!(ctx.store.get::<u64>(keys::REFRESH_INTERVAL_MIN).unwrap(), Some(30));
    }
}
