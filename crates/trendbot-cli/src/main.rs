mod collect;
mod query;
mod schedule;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendbot_core::Platform;

#[derive(Debug, Parser)]
#[command(name = "trendbot")]
#[command(about = "Scrape trending product listings and rank them by trend score")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every enabled source once
    Run {
        /// Comma-separated platforms to scrape (default: all)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<Platform>,

        /// Scrape and score without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape now, then again every N hours until interrupted
    Schedule {
        /// Hours between runs (1-24)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=24))]
        every_hours: u32,

        /// Comma-separated platforms to scrape (default: all)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<Platform>,
    },
    /// List stored products by trend score
    Products {
        #[arg(long)]
        platform: Option<Platform>,

        /// Only products scoring at least this much
        #[arg(long)]
        min_score: Option<f64>,

        /// Scraped at or after (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_timestamp)]
        since: Option<DateTime<Utc>>,

        /// Scraped at or before (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_timestamp)]
        until: Option<DateTime<Utc>>,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show metric history for one product
    History {
        #[arg(long)]
        platform: Platform,

        #[arg(long)]
        name: String,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List recent scrape runs
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = trendbot_core::load_app_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("no command given; try `trendbot --help`");
        return Ok(());
    };

    let pool_config = trendbot_db::PoolConfig::from_app_config(&config);
    let pool = trendbot_db::connect_pool(&config.database_url, pool_config)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    if let Commands::Db { command } = &command {
        return run_db(&pool, command).await;
    }

    let applied = trendbot_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    match command {
        Commands::Run { sources, dry_run } => {
            let report = collect::run_scrape(&pool, &config, &sources, dry_run, "cli").await?;
            collect::print_report(&report);
        }
        Commands::Schedule {
            every_hours,
            sources,
        } => schedule::run_schedule(pool, config, sources, every_hours).await?,
        Commands::Products {
            platform,
            min_score,
            since,
            until,
            limit,
        } => {
            let query = trendbot_db::ProductQuery {
                platform,
                min_score,
                since,
                until,
                limit: Some(limit),
            };
            query::run_products(&pool, &query).await?;
        }
        Commands::History {
            platform,
            name,
            limit,
        } => query::run_history(&pool, platform, &name, limit).await?,
        Commands::Runs { limit } => query::run_runs(&pool, limit).await?,
        Commands::Db { .. } => {}
    }

    Ok(())
}

async fn run_db(pool: &sqlx::SqlitePool, command: &DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            let applied = trendbot_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Ping => {
            trendbot_db::health_check(pool).await?;
            let products = trendbot_db::count_products(pool).await?;
            println!("database ok ({products} products)");
        }
    }
    Ok(())
}

/// Accepts RFC 3339 timestamps or bare dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{raw}' is not an RFC 3339 timestamp or YYYY-MM-DD date"))
}

pub(crate) fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
