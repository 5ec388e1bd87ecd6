use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headliner::app::AppContext;
use headliner::cli::{commands, Cli, Commands, FeedAction};
use headliner::config::Config;
use headliner::domain::Feed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Run { interval } => {
            commands::run(&ctx, interval.as_deref()).await?;
        }
        Commands::Poll => {
            commands::poll(&ctx).await?;
        }
        Commands::Articles { limit } => {
            commands::list_articles(&ctx, limit)?;
        }
        Commands::Status => {
            commands::show_status(&ctx)?;
        }
        Commands::Feed { action } => match action {
            FeedAction::Add {
                id,
                url,
                name,
                category,
                logo,
                select,
            } => {
                let mut feed = Feed::new(id.clone(), name.unwrap_or(id), url);
                if let Some(category) = category {
                    feed.category = category;
                }
                feed.logo_url = logo;
                commands::add_feed(&ctx, feed, select)?;
            }
            FeedAction::Remove { id } => {
                commands::remove_feed(&ctx, &id)?;
            }
            FeedAction::List => {
                commands::list_feeds(&ctx)?;
            }
        },
        Commands::Select { ids } => {
            commands::select_feeds(&ctx, ids)?;
        }
        Commands::Interval { minutes } => {
            commands::set_interval(&ctx, minutes)?;
        }
    }

    Ok(())
}
