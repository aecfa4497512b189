//! Scrape command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-source failures are recorded in the run report rather
//! than propagated, so one unreachable listing does not abort the run.

mod orchestrator;

pub(crate) use orchestrator::{Orchestrator, RunPlan, RunReport};

use sqlx::SqlitePool;
use trendbot_core::{AppConfig, Platform};
use trendbot_scraper::{ChromeSessionFactory, ScraperRegistry};

/// Runs one scrape over `sources` (every platform when empty) with the
/// built-in scrapers and a Chrome-backed session factory.
///
/// # Errors
///
/// Returns an error if the scrape run audit row cannot be written.
pub(crate) async fn run_scrape(
    pool: &SqlitePool,
    config: &AppConfig,
    sources: &[Platform],
    dry_run: bool,
    trigger: &str,
) -> anyhow::Result<RunReport> {
    let registry = ScraperRegistry::with_defaults();
    let sessions = ChromeSessionFactory::from_app_config(config);
    let plan = RunPlan::from_app_config(config, sources, dry_run);

    let orchestrator = Orchestrator::new(pool, &registry, &sessions, plan);
    let report = orchestrator.run(trigger).await?;
    tracing::debug!(state = %orchestrator.state(), "orchestrator settled");
    Ok(report)
}

/// Prints a per-source summary table, plus the scored records on dry runs.
pub(crate) fn print_report(report: &RunReport) {
    match report.scrape_run_id {
        Some(id) => println!("scrape run {id}: {}", report.status),
        None => println!("dry run: {} (nothing written)", report.status),
    }

    println!(
        "{:<12}{:<11}{:>7}{:>8}  ERROR",
        "SOURCE", "STATUS", "ITEMS", "ERRORS"
    );
    for source in &report.sources {
        let run = &source.run;
        println!(
            "{:<12}{:<11}{:>7}{:>8}  {}",
            run.platform,
            run.status,
            run.item_count,
            run.error_count,
            run.error_message.as_deref().unwrap_or("")
        );
    }

    let preview: Vec<_> = report.sources.iter().flat_map(|s| &s.preview).collect();
    if !preview.is_empty() {
        println!();
        println!("{:<12}{:>7}  NAME", "PLATFORM", "SCORE");
        for record in preview {
            println!(
                "{:<12}{:>7.1}  {}",
                record.platform,
                record.trend_score,
                crate::truncate(&record.name, 60)
            );
        }
    }
}
