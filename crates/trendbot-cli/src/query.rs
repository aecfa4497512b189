//! Read-only report commands over stored products and run audits.

use sqlx::SqlitePool;
use trendbot_core::Platform;
use trendbot_db::{DbError, ProductQuery};

use crate::{fmt_timestamp, truncate};

/// Lists stored products, highest trend score first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is malformed.
pub(crate) async fn run_products(pool: &SqlitePool, query: &ProductQuery) -> anyhow::Result<()> {
    let rows = trendbot_db::query_products(pool, query).await?;

    if rows.is_empty() {
        println!(
            "no products found{}; run `trendbot run` first",
            query
                .platform
                .map(|p| format!(" for {p}"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    let header = format!(
        "{:<12}{:>7}{:>9}{:>9}{:>8}{:>8}{:>7}  {:<18}NAME",
        "PLATFORM", "SCORE", "REVIEWS", "ORDERS", "VOTES", "RATING", "PRICE", "SCRAPED"
    );
    println!("{header}");
    for row in &rows {
        let record = row.to_record()?;
        let price = record
            .price
            .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
        println!(
            "{:<12}{:>7.1}{:>9}{:>9}{:>8}{:>8.1}{:>7}  {:<18}{}",
            record.platform,
            record.trend_score,
            record.metrics.reviews,
            record.metrics.orders,
            record.metrics.votes,
            record.metrics.rating,
            price,
            fmt_timestamp(record.scraped_at),
            truncate(&record.name, 50)
        );
    }

    Ok(())
}

/// Shows one product and its metric snapshots, newest first.
///
/// # Errors
///
/// Returns an error if the product is not stored or the query fails.
pub(crate) async fn run_history(
    pool: &SqlitePool,
    platform: Platform,
    name: &str,
    limit: i64,
) -> anyhow::Result<()> {
    let product = match trendbot_db::get_product(pool, platform, name).await {
        Ok(product) => product,
        Err(DbError::NotFound) => {
            anyhow::bail!("product '{name}' on {platform} not found; run `trendbot run` first")
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} ({})", product.name, product.platform);
    if let Some(url) = &product.url {
        println!("URL: {url}");
    }
    println!(
        "First seen: {}  Last seen: {}",
        fmt_timestamp(product.first_seen),
        fmt_timestamp(product.last_seen)
    );
    println!();

    let snapshots = trendbot_db::list_metric_history(pool, product.id, limit).await?;
    println!(
        "{:<18}{:>7}{:>9}{:>9}{:>8}{:>10}{:>8}  RUN",
        "CAPTURED", "SCORE", "REVIEWS", "ORDERS", "VOTES", "COMMENTS", "RATING"
    );
    for snap in &snapshots {
        println!(
            "{:<18}{:>7.1}{:>9}{:>9}{:>8}{:>10}{:>8.1}  {}",
            fmt_timestamp(snap.captured_at),
            snap.trend_score,
            snap.reviews,
            snap.orders,
            snap.votes,
            snap.comments,
            snap.rating,
            snap.scrape_run_id
                .map_or_else(|| "-".to_string(), |id| id.to_string())
        );
    }

    Ok(())
}

/// Lists recent scrape runs with their per-source outcomes.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_runs(pool: &SqlitePool, limit: i64) -> anyhow::Result<()> {
    let runs = trendbot_db::list_scrape_runs(pool, limit).await?;

    if runs.is_empty() {
        println!("no scrape runs found; run `trendbot run` first");
        return Ok(());
    }

    for run in &runs {
        let finished = run
            .finished_at
            .map_or_else(|| "-".to_string(), fmt_timestamp);
        println!(
            "#{:<6}{:<22}{:<10}started {}  finished {}  items {}  errors {}",
            run.id,
            run.status,
            run.trigger_source,
            fmt_timestamp(run.started_at),
            finished,
            run.item_count,
            run.error_count
        );

        for source in trendbot_db::list_source_runs(pool, run.id).await? {
            println!(
                "        {:<12}{:<11}items {:<5}errors {:<5}{}",
                source.platform,
                source.status,
                source.item_count,
                source.error_count,
                source.error_message.as_deref().map(|m| truncate(m, 60)).unwrap_or_default()
            );
        }
    }

    Ok(())
}
