pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "headliner")]
#[command(about = "Polls RSS/Atom feeds into a normalized article cache", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/headliner/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler until interrupted
    Run {
        /// Refresh interval to store before starting (e.g., "15m", "1h", "900s")
        #[arg(short, long)]
        interval: Option<String>,
    },
    /// Run a single poll cycle
    Poll,
    /// Show cached articles, newest first
    Articles {
        /// Maximum number of articles to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the outcome of the last poll cycle
    Status,
    /// Manage configured feeds
    Feed {
        #[command(subcommand)]
        action: FeedAction,
    },
    /// Replace the set of selected feed ids
    Select {
        /// Feed ids to poll
        ids: Vec<String>,
    },
    /// Set the refresh interval in minutes
    Interval {
        minutes: u64,
    },
}

#[derive(Subcommand)]
pub enum FeedAction {
    /// Add or replace a feed
    Add {
        /// Unique feed id (e.g., "bbc-news")
        id: String,
        /// URL of the RSS/Atom document
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Logo URL overriding the one in the feed
        #[arg(long)]
        logo: Option<String>,
        /// Also add the feed to the selection
        #[arg(long)]
        select: bool,
    },
    /// Remove a feed and deselect it
    Remove { id: String },
    /// List configured feeds
    List,
}

/// Parse an interval like "1h", "30m", "1d", "900s" or bare seconds into seconds.
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| h * 3600)
            .map_err(|_| format!("Invalid hours: {}", hours))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map(|m| m * 60)
            .map_err(|_| format!("Invalid minutes: {}", minutes))
    } else if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map(|d| d * 86400)
            .map_err(|_| format!("Invalid days: {}", days))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '15m', '1h', '900s'", s))
    }
}

/// Whole minutes for an interval in seconds, rounded up, never zero.
pub fn interval_minutes(secs: u64) -> u64 {
    secs.div_ceil(60).max(1)
}
