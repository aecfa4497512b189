//! Integration tests for trendbot-db against a fresh in-memory database.
//!
//! Each test gets its own single-connection `sqlite::memory:` pool with every
//! migration applied.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use trendbot_core::{
    Metrics, Platform, ProductRecord, ScrapeRunStatus, SourceRun, SourceRunStatus,
};
use trendbot_db::{
    connect_in_memory, count_products, create_scrape_run, finish_scrape_run, get_product,
    get_scrape_run, insert_source_run, list_metric_history, list_scrape_runs, list_source_runs,
    query_products, run_migrations, upsert_product, DbError, ProductQuery,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn fresh_pool() -> SqlitePool {
    let pool = connect_in_memory()
        .await
        .expect("connect_in_memory failed");
    run_migrations(&pool).await.expect("run_migrations failed");
    pool
}

fn record(platform: Platform, name: &str, score: f64) -> ProductRecord {
    ProductRecord {
        platform,
        name: name.to_string(),
        url: None,
        image_url: None,
        description: Some(format!("Discovered via {platform}")),
        price: None,
        scraped_at: Utc::now(),
        metrics: Metrics::default(),
        trend_score: score,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Product upsert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upsert_same_key_twice_keeps_one_row_and_second_write_wins() {
    let pool = fresh_pool().await;

    let mut first = record(Platform::Amazon, "Widget", 40.0);
    first.metrics.reviews = 10;
    first.price = Some(9.99);
    first.scraped_at = Utc::now() - Duration::hours(2);
    let first_id = upsert_product(&pool, &first, None)
        .await
        .expect("first upsert failed");

    let mut second = record(Platform::Amazon, "Widget", 55.0);
    second.metrics.reviews = 120;
    second.metrics.rating = 4.5;
    second.url = Some("https://www.amazon.com/dp/B000".to_string());
    let second_id = upsert_product(&pool, &second, None)
        .await
        .expect("second upsert failed");

    assert_eq!(first_id, second_id, "upsert must reuse the existing row");
    assert_eq!(count_products(&pool).await.expect("count"), 1);

    let row = get_product(&pool, Platform::Amazon, "Widget")
        .await
        .expect("get_product failed");
    assert_eq!(row.reviews, 120);
    assert!((row.rating - 4.5).abs() < f64::EPSILON);
    assert!((row.trend_score - 55.0).abs() < f64::EPSILON);
    assert_eq!(row.price, None, "absent price overwrites the old one");
    assert_eq!(row.url.as_deref(), Some("https://www.amazon.com/dp/B000"));
    assert_eq!(row.first_seen, first.scraped_at);
    assert_eq!(row.last_seen, second.scraped_at);
}

#[tokio::test]
async fn same_name_on_different_platforms_are_distinct_products() {
    let pool = fresh_pool().await;

    upsert_product(&pool, &record(Platform::Amazon, "Widget", 10.0), None)
        .await
        .expect("amazon upsert failed");
    upsert_product(&pool, &record(Platform::Reddit, "Widget", 10.0), None)
        .await
        .expect("reddit upsert failed");

    assert_eq!(count_products(&pool).await.expect("count"), 2);
}

#[tokio::test]
async fn every_upsert_appends_a_metric_snapshot() {
    let pool = fresh_pool().await;
    let run = create_scrape_run(&pool, "cli").await.expect("create run");

    let mut rec = record(Platform::AliExpress, "Mini Projector", 30.0);
    rec.metrics.orders = 100;
    rec.scraped_at = Utc::now() - Duration::minutes(5);
    let id = upsert_product(&pool, &rec, Some(run.id))
        .await
        .expect("first upsert failed");

    rec.metrics.orders = 250;
    rec.scraped_at = Utc::now();
    upsert_product(&pool, &rec, None)
        .await
        .expect("second upsert failed");

    let history = list_metric_history(&pool, id, 10)
        .await
        .expect("list_metric_history failed");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].orders, 250, "newest snapshot first");
    assert_eq!(history[0].scrape_run_id, None);
    assert_eq!(history[1].orders, 100);
    assert_eq!(history[1].scrape_run_id, Some(run.id));
}

#[tokio::test]
async fn get_product_missing_is_not_found() {
    let pool = fresh_pool().await;
    let result = get_product(&pool, Platform::Reddit, "nothing").await;
    assert!(matches!(result, Err(DbError::NotFound)), "got: {result:?}");
}

// ---------------------------------------------------------------------------
// Section 2: Product queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_orders_by_score_then_recency_then_id() {
    let pool = fresh_pool().await;
    let now = Utc::now();

    let mut low = record(Platform::Amazon, "Low", 20.0);
    low.scraped_at = now;
    let mut older_tie = record(Platform::Amazon, "Older Tie", 50.0);
    older_tie.scraped_at = now - Duration::hours(1);
    let mut newer_tie = record(Platform::Reddit, "Newer Tie", 50.0);
    newer_tie.scraped_at = now;
    let mut top = record(Platform::AliExpress, "Top", 90.0);
    top.scraped_at = now - Duration::days(1);

    for rec in [&low, &older_tie, &newer_tie, &top] {
        upsert_product(&pool, rec, None).await.expect("upsert failed");
    }

    let rows = query_products(&pool, &ProductQuery::default())
        .await
        .expect("query_products failed");
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Top", "Newer Tie", "Older Tie", "Low"]);
}

#[tokio::test]
async fn query_ties_on_score_and_time_break_on_id_desc() {
    let pool = fresh_pool().await;
    let at = Utc::now();

    let mut a = record(Platform::Amazon, "A", 33.0);
    a.scraped_at = at;
    let mut b = record(Platform::Amazon, "B", 33.0);
    b.scraped_at = at;
    upsert_product(&pool, &a, None).await.expect("upsert a");
    upsert_product(&pool, &b, None).await.expect("upsert b");

    let rows = query_products(&pool, &ProductQuery::default())
        .await
        .expect("query_products failed");
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["B", "A"]);
}

#[tokio::test]
async fn query_filters_by_platform_score_range_and_limit() {
    let pool = fresh_pool().await;
    let now = Utc::now();

    let mut old = record(Platform::Amazon, "Old", 80.0);
    old.scraped_at = now - Duration::days(10);
    let mut fresh = record(Platform::Amazon, "Fresh", 70.0);
    fresh.scraped_at = now;
    let mut weak = record(Platform::Amazon, "Weak", 5.0);
    weak.scraped_at = now;
    let mut other = record(Platform::Reddit, "Other", 99.0);
    other.scraped_at = now;

    for rec in [&old, &fresh, &weak, &other] {
        upsert_product(&pool, rec, None).await.expect("upsert failed");
    }

    let amazon_only = query_products(
        &pool,
        &ProductQuery {
            platform: Some(Platform::Amazon),
            ..ProductQuery::default()
        },
    )
    .await
    .expect("platform query failed");
    assert_eq!(amazon_only.len(), 3);
    assert!(amazon_only.iter().all(|r| r.platform == "amazon"));

    let scored = query_products(
        &pool,
        &ProductQuery {
            platform: Some(Platform::Amazon),
            min_score: Some(50.0),
            ..ProductQuery::default()
        },
    )
    .await
    .expect("score query failed");
    let names: Vec<&str> = scored.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Old", "Fresh"]);

    let recent = query_products(
        &pool,
        &ProductQuery {
            platform: Some(Platform::Amazon),
            since: Some(now - Duration::days(1)),
            until: Some(now),
            ..ProductQuery::default()
        },
    )
    .await
    .expect("range query failed");
    let names: Vec<&str> = recent.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Fresh", "Weak"]);

    let limited = query_products(
        &pool,
        &ProductQuery {
            limit: Some(2),
            ..ProductQuery::default()
        },
    )
    .await
    .expect("limit query failed");
    let names: Vec<&str> = limited.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Other", "Old"]);
}

// ---------------------------------------------------------------------------
// Section 3: Run audit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_run_lifecycle_running_to_complete_with_errors() {
    let pool = fresh_pool().await;

    let run = create_scrape_run(&pool, "schedule")
        .await
        .expect("create_scrape_run failed");
    assert_eq!(run.status, "running");
    assert_eq!(run.trigger_source, "schedule");
    assert!(run.finished_at.is_none());

    finish_scrape_run(&pool, run.id, ScrapeRunStatus::CompleteWithErrors, 8, 2)
        .await
        .expect("finish_scrape_run failed");

    let fetched = get_scrape_run(&pool, run.id)
        .await
        .expect("get_scrape_run failed");
    assert_eq!(fetched.status, "complete_with_errors");
    assert!(fetched.finished_at.is_some());
    assert_eq!(fetched.item_count, 8);
    assert_eq!(fetched.error_count, 2);
}

#[tokio::test]
async fn scrape_run_cannot_finish_twice() {
    let pool = fresh_pool().await;
    let run = create_scrape_run(&pool, "cli").await.expect("create run");

    finish_scrape_run(&pool, run.id, ScrapeRunStatus::Complete, 1, 0)
        .await
        .expect("first finish failed");
    let result = finish_scrape_run(&pool, run.id, ScrapeRunStatus::Complete, 1, 0).await;

    assert!(
        matches!(
            result,
            Err(DbError::InvalidScrapeRunTransition {
                expected_status: "running",
                ..
            })
        ),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn source_runs_are_listed_in_insertion_order() {
    let pool = fresh_pool().await;
    let run = create_scrape_run(&pool, "cli").await.expect("create run");
    let started_at = Utc::now();

    for (platform, status, error) in [
        (Platform::Amazon, SourceRunStatus::Failed, Some("blocked")),
        (Platform::Reddit, SourceRunStatus::Succeeded, None),
    ] {
        let source_run = SourceRun {
            platform,
            started_at,
            finished_at: started_at + Duration::seconds(3),
            item_count: if error.is_some() { 0 } else { 4 },
            error_count: u32::from(error.is_some()),
            status,
            error_message: error.map(str::to_string),
        };
        insert_source_run(&pool, run.id, &source_run)
            .await
            .expect("insert_source_run failed");
    }

    let rows = list_source_runs(&pool, run.id)
        .await
        .expect("list_source_runs failed");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].platform, "amazon");
    assert_eq!(rows[0].status, "failed");
    assert_eq!(rows[0].error_message.as_deref(), Some("blocked"));
    assert_eq!(rows[1].platform, "reddit");
    assert_eq!(rows[1].item_count, 4);
}

#[tokio::test]
async fn source_run_for_unknown_scrape_run_is_rejected() {
    let pool = fresh_pool().await;
    let now = Utc::now();
    let source_run = SourceRun {
        platform: Platform::Amazon,
        started_at: now,
        finished_at: now,
        item_count: 0,
        error_count: 0,
        status: SourceRunStatus::Succeeded,
        error_message: None,
    };

    let result = insert_source_run(&pool, 9_999, &source_run).await;
    assert!(matches!(result, Err(DbError::Sqlx(_))), "got: {result:?}");
}

#[tokio::test]
async fn list_scrape_runs_returns_newest_first() {
    let pool = fresh_pool().await;
    let first = create_scrape_run(&pool, "cli").await.expect("first run");
    let second = create_scrape_run(&pool, "cli").await.expect("second run");

    let runs = list_scrape_runs(&pool, 10)
        .await
        .expect("list_scrape_runs failed");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second.id);
    assert_eq!(runs[1].id, first.id);
}
