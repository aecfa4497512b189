//! Database operations for `products` and the `metrics` history table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use trendbot_core::{Metrics, Platform, ProductRecord};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub platform: String,
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub reviews: i64,
    pub orders: i64,
    pub votes: i64,
    pub comments: i64,
    pub rating: f64,
    pub trend_score: f64,
    pub scraped_at: DateTime<Utc>,
    /// Set on first insert and never touched by later upserts.
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ProductRow {
    /// Converts the row back into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if the stored platform is unknown.
    pub fn to_record(&self) -> Result<ProductRecord, DbError> {
        let platform: Platform = self.platform.parse().map_err(|e| DbError::InvalidRow {
            table: "products",
            id: self.id,
            reason: format!("{e}"),
        })?;

        Ok(ProductRecord {
            platform,
            name: self.name.clone(),
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            description: self.description.clone(),
            price: self.price,
            scraped_at: self.scraped_at,
            metrics: Metrics {
                reviews: self.reviews,
                orders: self.orders,
                votes: self.votes,
                comments: self.comments,
                rating: self.rating,
            },
            trend_score: self.trend_score,
        })
    }
}

/// A row from the `metrics` history table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetricSnapshotRow {
    pub id: i64,
    pub product_id: i64,
    /// Nullable: ad-hoc upserts outside an orchestrator run carry no run id.
    pub scrape_run_id: Option<i64>,
    pub captured_at: DateTime<Utc>,
    pub reviews: i64,
    pub orders: i64,
    pub votes: i64,
    pub comments: i64,
    pub rating: f64,
    pub price: Option<f64>,
    pub trend_score: f64,
}

/// Input filters for [`query_products`].
///
/// `limit` is `None` to return every matching product.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub platform: Option<Platform>,
    pub min_score: Option<f64>,
    /// Inclusive lower bound on `scraped_at`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `scraped_at`.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

const PRODUCT_COLUMNS: &str = "id, platform, name, url, image_url, description, price, \
     reviews, orders, votes, comments, rating, trend_score, \
     scraped_at, first_seen, last_seen";

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Upserts a product keyed on `(platform, name)` and appends a metric snapshot.
///
/// The second write's values win for every mutable column; `first_seen` keeps
/// its first insert time and `last_seen` moves to `record.scraped_at`.
/// Both statements run in one transaction so a snapshot never exists without
/// its product update.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert or snapshot insert fails.
pub async fn upsert_product(
    pool: &SqlitePool,
    record: &ProductRecord,
    scrape_run_id: Option<i64>,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (platform, name, url, image_url, description, price, \
              reviews, orders, votes, comments, rating, trend_score, \
              scraped_at, first_seen, last_seen) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13, ?13) \
         ON CONFLICT (platform, name) DO UPDATE SET \
             url         = excluded.url, \
             image_url   = excluded.image_url, \
             description = excluded.description, \
             price       = excluded.price, \
             reviews     = excluded.reviews, \
             orders      = excluded.orders, \
             votes       = excluded.votes, \
             comments    = excluded.comments, \
             rating      = excluded.rating, \
             trend_score = excluded.trend_score, \
             scraped_at  = excluded.scraped_at, \
             last_seen   = excluded.last_seen \
         RETURNING id",
    )
    .bind(record.platform.as_str())
    .bind(&record.name)
    .bind(&record.url)
    .bind(&record.image_url)
    .bind(&record.description)
    .bind(record.price)
    .bind(record.metrics.reviews)
    .bind(record.metrics.orders)
    .bind(record.metrics.votes)
    .bind(record.metrics.comments)
    .bind(record.metrics.rating)
    .bind(record.trend_score)
    .bind(record.scraped_at)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO metrics \
             (product_id, scrape_run_id, captured_at, reviews, orders, votes, \
              comments, rating, price, trend_score) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(id)
    .bind(scrape_run_id)
    .bind(record.scraped_at)
    .bind(record.metrics.reviews)
    .bind(record.metrics.orders)
    .bind(record.metrics.votes)
    .bind(record.metrics.comments)
    .bind(record.metrics.rating)
    .bind(record.price)
    .bind(record.trend_score)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(
        product_id = id,
        platform = %record.platform,
        name = %record.name,
        trend_score = record.trend_score,
        "product upserted"
    );
    Ok(id)
}

/// Returns products matching `query`, best trend score first.
///
/// Ties break on `scraped_at DESC`, then `id DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn query_products(
    pool: &SqlitePool,
    query: &ProductQuery,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products \
         WHERE (?1 IS NULL OR platform = ?1) \
           AND (?2 IS NULL OR trend_score >= ?2) \
           AND (?3 IS NULL OR scraped_at >= ?3) \
           AND (?4 IS NULL OR scraped_at <= ?4) \
         ORDER BY trend_score DESC, scraped_at DESC, id DESC \
         LIMIT COALESCE(?5, -1)"
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(query.platform.map(Platform::as_str))
        .bind(query.min_score)
        .bind(query.since)
        .bind(query.until)
        .bind(query.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetches a single product by its natural key.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for the key, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_product(
    pool: &SqlitePool,
    platform: Platform,
    name: &str,
) -> Result<ProductRow, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE platform = ?1 AND name = ?2");

    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(platform.as_str())
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns total number of stored products.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

// ---------------------------------------------------------------------------
// metrics operations
// ---------------------------------------------------------------------------

/// Returns the most recent `limit` snapshots for a product, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_metric_history(
    pool: &SqlitePool,
    product_id: i64,
    limit: i64,
) -> Result<Vec<MetricSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, MetricSnapshotRow>(
        "SELECT id, product_id, scrape_run_id, captured_at, reviews, orders, votes, \
                comments, rating, price, trend_score \
         FROM metrics \
         WHERE product_id = ?1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT ?2",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
