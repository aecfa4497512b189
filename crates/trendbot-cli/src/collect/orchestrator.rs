//! Sequential run orchestrator.
//!
//! Sources are scraped one at a time, each in its own browser session. A
//! source that fails outright is recorded and skipped; the run always reaches
//! a terminal state.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::watch;
use trendbot_core::{
    AppConfig, Platform, ProductRecord, ScrapeRunStatus, SourceRun, SourceRunStatus,
};
use trendbot_scraper::{
    close_session, dump_page, normalize_batch, open_session, DelayRange, NormalizedBatch,
    ScrapeOptions, ScraperError, ScraperRegistry, SessionFactory, SessionOptions,
};

/// Where an orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Platform),
    Complete,
    CompleteWithErrors,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running(platform) => write!(f, "running {platform}"),
            RunState::Complete => f.write_str("complete"),
            RunState::CompleteWithErrors => f.write_str("complete with errors"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourcePlan {
    pub platform: Platform,
    pub listing_url: String,
}

/// Everything one run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Scraped in this order.
    pub sources: Vec<SourcePlan>,
    pub session: SessionOptions,
    pub max_items: usize,
    pub delay: DelayRange,
    pub debug_dir: Option<PathBuf>,
    /// Scrape and score without writing anything.
    pub dry_run: bool,
}

impl RunPlan {
    /// Builds a plan for `sources`, or for every platform when empty.
    /// Repeated platforms are scraped once.
    #[must_use]
    pub fn from_app_config(config: &AppConfig, sources: &[Platform], dry_run: bool) -> Self {
        let requested: &[Platform] = if sources.is_empty() {
            &Platform::ALL
        } else {
            sources
        };

        let mut plans: Vec<SourcePlan> = Vec::with_capacity(requested.len());
        for &platform in requested {
            if plans.iter().any(|p| p.platform == platform) {
                continue;
            }
            plans.push(SourcePlan {
                platform,
                listing_url: config.listing_url(platform).to_string(),
            });
        }

        Self {
            sources: plans,
            session: SessionOptions::from_app_config(config),
            max_items: config.max_items,
            delay: DelayRange::from_app_config(config),
            debug_dir: config.debug_dir.clone(),
            dry_run,
        }
    }
}

/// Outcome of one source's pass.
#[derive(Debug)]
pub struct SourceReport {
    pub run: SourceRun,
    pub navigation_failure: Option<ScraperError>,
    pub extraction_failures: usize,
    pub persistence_failures: usize,
    /// Scored records that were not written. Only filled on dry runs.
    pub preview: Vec<ProductRecord>,
}

impl SourceReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.navigation_failure.is_some()
            || self.extraction_failures > 0
            || self.persistence_failures > 0
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// `None` on dry runs.
    pub scrape_run_id: Option<i64>,
    pub status: ScrapeRunStatus,
    pub sources: Vec<SourceReport>,
    /// Pauses actually taken between sources.
    pub pauses: Vec<Duration>,
}

impl RunReport {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.sources
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.run.item_count))
    }

    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.sources
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.run.error_count))
    }
}

pub struct Orchestrator<'a> {
    pool: &'a SqlitePool,
    registry: &'a ScraperRegistry,
    sessions: &'a dyn SessionFactory,
    plan: RunPlan,
    state: watch::Sender<RunState>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        pool: &'a SqlitePool,
        registry: &'a ScraperRegistry,
        sessions: &'a dyn SessionFactory,
        plan: RunPlan,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            pool,
            registry,
            sessions,
            plan,
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Runs every planned source once.
    ///
    /// Source-level failures are recorded in the report and never abort the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the scrape run audit row cannot be created.
    /// Failing to finish it is logged and the report is still returned.
    pub async fn run(&self, trigger: &str) -> anyhow::Result<RunReport> {
        let scrape_run_id = if self.plan.dry_run {
            None
        } else {
            let run = trendbot_db::create_scrape_run(self.pool, trigger)
                .await
                .context("failed to create scrape run")?;
            Some(run.id)
        };

        tracing::info!(
            trigger,
            scrape_run_id,
            sources = self.plan.sources.len(),
            dry_run = self.plan.dry_run,
            "scrape run started"
        );

        let mut sources = Vec::with_capacity(self.plan.sources.len());
        let mut pauses = Vec::new();
        for (i, source) in self.plan.sources.iter().enumerate() {
            self.state.send_replace(RunState::Running(source.platform));
            sources.push(self.run_source(scrape_run_id, source).await);

            if i + 1 < self.plan.sources.len() {
                pauses.push(self.plan.delay.sleep().await);
            }
        }

        let status = if sources.iter().any(SourceReport::has_errors) {
            ScrapeRunStatus::CompleteWithErrors
        } else {
            ScrapeRunStatus::Complete
        };
        let report = RunReport {
            scrape_run_id,
            status,
            sources,
            pauses,
        };

        if let Some(id) = scrape_run_id {
            if let Err(e) = trendbot_db::finish_scrape_run(
                self.pool,
                id,
                status,
                report.item_count(),
                report.error_count(),
            )
            .await
            {
                tracing::error!(
                    scrape_run_id = id,
                    error = %e,
                    "failed to finish scrape run"
                );
            }
        }
        self.state.send_replace(settled_state(status));

        tracing::info!(
            scrape_run_id,
            status = %status,
            items = report.item_count(),
            errors = report.error_count(),
            paused_ms = report.pauses.iter().sum::<Duration>().as_millis(),
            "scrape run finished"
        );
        Ok(report)
    }

    async fn run_source(&self, scrape_run_id: Option<i64>, source: &SourcePlan) -> SourceReport {
        let platform = source.platform;
        let started_at = Utc::now();

        let (batch, navigation_failure) = self.scrape_source(source).await;
        let extraction_failures = batch.failure_count();

        let mut persisted = 0usize;
        let mut persistence_failures = 0usize;
        let mut preview = Vec::new();
        if self.plan.dry_run {
            persisted = batch.records.len();
            preview = batch.records;
        } else {
            for record in &batch.records {
                match trendbot_db::upsert_product(self.pool, record, scrape_run_id).await {
                    Ok(_) => persisted += 1,
                    Err(e) => {
                        persistence_failures += 1;
                        tracing::error!(
                            platform = %platform,
                            product = %record.name,
                            error = %e,
                            "failed to persist product"
                        );
                    }
                }
            }
        }

        let status = if navigation_failure.is_some() {
            SourceRunStatus::Failed
        } else if extraction_failures > 0 || persistence_failures > 0 {
            SourceRunStatus::Partial
        } else {
            SourceRunStatus::Succeeded
        };
        let error_message = match &navigation_failure {
            Some(e) => Some(e.to_string()),
            None if status == SourceRunStatus::Partial => Some(format!(
                "{extraction_failures} items skipped, {persistence_failures} writes failed"
            )),
            None => None,
        };
        let error_count = usize::from(navigation_failure.is_some())
            .saturating_add(extraction_failures)
            .saturating_add(persistence_failures);

        let run = SourceRun {
            platform,
            started_at,
            finished_at: Utc::now(),
            item_count: saturating_u32(persisted),
            error_count: saturating_u32(error_count),
            status,
            error_message,
        };

        if let Some(id) = scrape_run_id {
            if let Err(e) = trendbot_db::insert_source_run(self.pool, id, &run).await {
                tracing::error!(
                    platform = %platform,
                    scrape_run_id = id,
                    error = %e,
                    "failed to record source run"
                );
            }
        }

        tracing::info!(
            platform = %platform,
            status = %run.status,
            items = run.item_count,
            errors = run.error_count,
            elapsed_ms = run.duration().num_milliseconds(),
            "source finished"
        );

        SourceReport {
            run,
            navigation_failure,
            extraction_failures,
            persistence_failures,
            preview,
        }
    }

    /// Opens a session, scrapes the listing, closes the session and
    /// normalizes what came back.
    async fn scrape_source(&self, source: &SourcePlan) -> (NormalizedBatch, Option<ScraperError>) {
        let platform = source.platform;

        let Some(scraper) = self.registry.get(platform) else {
            let failure = ScraperError::Navigation {
                platform,
                url: source.listing_url.clone(),
                reason: "no scraper registered".to_string(),
            };
            tracing::error!(platform = %platform, error = %failure, "source skipped");
            return (NormalizedBatch::default(), Some(failure));
        };

        let mut session = match open_session(self.sessions, &self.plan.session).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    platform = %platform,
                    error = %e,
                    "could not open browser session"
                );
                return (NormalizedBatch::default(), Some(e));
            }
        };

        let options = ScrapeOptions {
            listing_url: source.listing_url.clone(),
            max_items: self.plan.max_items,
            timeout: self.plan.session.page_timeout,
        };
        let outcome = scraper.scrape(&mut *session, &options).await;
        close_session(session).await;

        if let Some(failure) = &outcome.failure {
            tracing::error!(
                platform = %platform,
                url = %source.listing_url,
                kind = failure.kind(),
                error = %failure,
                "listing scrape failed"
            );
            if let (Some(dir), Some(html)) = (&self.plan.debug_dir, &outcome.page_html) {
                if let Err(e) = dump_page(dir, platform, html) {
                    tracing::warn!(
                        platform = %platform,
                        dir = %dir.display(),
                        error = %e,
                        "failed to save debug page"
                    );
                }
            }
        }

        (normalize_batch(outcome.listing), outcome.failure)
    }
}

/// State after a run. Only called once every source is done, so a status
/// that is not `Complete` means errors were recorded.
fn settled_state(status: ScrapeRunStatus) -> RunState {
    match status {
        ScrapeRunStatus::Complete => RunState::Complete,
        ScrapeRunStatus::Running | ScrapeRunStatus::CompleteWithErrors => {
            RunState::CompleteWithErrors
        }
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
