//! Interval re-runs of the scrape orchestrator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trendbot_core::{AppConfig, Platform};

use crate::collect;

/// Time between scheduled runs.
///
/// # Errors
///
/// Returns an error unless `every_hours` is in `1..=24`.
pub(crate) fn interval_period(every_hours: u32) -> anyhow::Result<Duration> {
    if !(1..=24).contains(&every_hours) {
        anyhow::bail!("--every-hours must be between 1 and 24, got {every_hours}");
    }
    Ok(Duration::from_secs(u64::from(every_hours) * 3600))
}

/// A job that calls `tick` once per `period`, measured from scheduler start.
fn interval_job<F, Fut>(period: Duration, tick: F) -> Result<Job, JobSchedulerError>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Job::new_repeated_async(period, move |_uuid, _lock| Box::pin(tick()))
}

/// Runs once immediately, then on every tick of the interval until Ctrl-C.
///
/// Runs never overlap: a tick that fires while a run is still in flight is
/// skipped.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built or started.
pub(crate) async fn run_schedule(
    pool: SqlitePool,
    config: AppConfig,
    sources: Vec<Platform>,
    every_hours: u32,
) -> anyhow::Result<()> {
    let period = interval_period(every_hours)?;
    let pool = Arc::new(pool);
    let config = Arc::new(config);
    let sources = Arc::new(sources);
    let in_flight = Arc::new(Mutex::new(()));

    run_guarded(&pool, &config, &sources, &in_flight, "schedule").await;

    let mut scheduler = JobScheduler::new().await?;
    let job = {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let sources = Arc::clone(&sources);
        let in_flight = Arc::clone(&in_flight);
        interval_job(period, move || {
            let pool = Arc::clone(&pool);
            let config = Arc::clone(&config);
            let sources = Arc::clone(&sources);
            let in_flight = Arc::clone(&in_flight);
            async move {
                run_guarded(&pool, &config, &sources, &in_flight, "schedule").await;
            }
        })?
    };
    scheduler.add(job).await?;

    tracing::info!(every_hours, period_secs = period.as_secs(), "scrape scheduler started");
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

async fn run_guarded(
    pool: &SqlitePool,
    config: &AppConfig,
    sources: &[Platform],
    in_flight: &Mutex<()>,
    trigger: &str,
) {
    let Ok(_guard) = in_flight.try_lock() else {
        tracing::warn!(trigger, "previous scrape run still in progress; skipping tick");
        return;
    };

    match collect::run_scrape(pool, config, sources, false, trigger).await {
        Ok(report) => tracing::info!(
            trigger,
            status = %report.status,
            items = report.item_count(),
            errors = report.error_count(),
            "scheduled scrape finished"
        ),
        Err(e) => tracing::error!(trigger, error = %e, "scheduled scrape failed"),
    }
}
