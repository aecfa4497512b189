//! Database operations for `scrape_runs` and `source_runs`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use trendbot_core::{ScrapeRunStatus, SourceRun};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: i64,
    /// `"cli"` or `"schedule"`.
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub item_count: i64,
    pub error_count: i64,
}

/// A row from the `source_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRunRow {
    pub id: i64,
    pub scrape_run_id: i64,
    pub platform: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub item_count: i64,
    pub error_count: i64,
    pub error_message: Option<String>,
}

const SCRAPE_RUN_COLUMNS: &str =
    "id, trigger_source, status, started_at, finished_at, item_count, error_count";

// ---------------------------------------------------------------------------
// scrape_runs operations
// ---------------------------------------------------------------------------

/// Creates a new scrape run in `running` status, started now.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_run(
    pool: &SqlitePool,
    trigger_source: &str,
) -> Result<ScrapeRunRow, DbError> {
    let sql = format!(
        "INSERT INTO scrape_runs (trigger_source, status, started_at) \
         VALUES (?1, ?2, ?3) \
         RETURNING {SCRAPE_RUN_COLUMNS}"
    );

    let row = sqlx::query_as::<_, ScrapeRunRow>(&sql)
        .bind(trigger_source)
        .bind(ScrapeRunStatus::Running.as_str())
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Moves a `running` scrape run to its terminal status and records totals.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn finish_scrape_run(
    pool: &SqlitePool,
    id: i64,
    status: ScrapeRunStatus,
    item_count: u32,
    error_count: u32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = ?1, finished_at = ?2, item_count = ?3, error_count = ?4 \
         WHERE id = ?5 AND status = 'running'",
    )
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(i64::from(item_count))
    .bind(i64::from(error_count))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single scrape run by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_run(pool: &SqlitePool, id: i64) -> Result<ScrapeRunRow, DbError> {
    let sql = format!("SELECT {SCRAPE_RUN_COLUMNS} FROM scrape_runs WHERE id = ?1");

    sqlx::query_as::<_, ScrapeRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` scrape runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_runs(pool: &SqlitePool, limit: i64) -> Result<Vec<ScrapeRunRow>, DbError> {
    let sql = format!(
        "SELECT {SCRAPE_RUN_COLUMNS} FROM scrape_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT ?1"
    );

    let rows = sqlx::query_as::<_, ScrapeRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// source_runs operations
// ---------------------------------------------------------------------------

/// Appends the audit row for one source's pass. Rows are never updated.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown
/// `scrape_run_id`, rejected by the foreign key).
pub async fn insert_source_run(
    pool: &SqlitePool,
    scrape_run_id: i64,
    run: &SourceRun,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO source_runs \
             (scrape_run_id, platform, status, started_at, finished_at, \
              item_count, error_count, error_message) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         RETURNING id",
    )
    .bind(scrape_run_id)
    .bind(run.platform.as_str())
    .bind(run.status.as_str())
    .bind(run.started_at)
    .bind(run.finished_at)
    .bind(i64::from(run.item_count))
    .bind(i64::from(run.error_count))
    .bind(&run.error_message)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns every source row for a scrape run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_source_runs(
    pool: &SqlitePool,
    scrape_run_id: i64,
) -> Result<Vec<SourceRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SourceRunRow>(
        "SELECT id, scrape_run_id, platform, status, started_at, finished_at, \
                item_count, error_count, error_message \
         FROM source_runs \
         WHERE scrape_run_id = ?1 \
         ORDER BY id ASC",
    )
    .bind(scrape_run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
