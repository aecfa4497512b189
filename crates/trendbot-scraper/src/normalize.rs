//! Maps platform-specific [`RawItem`] fields onto canonical product records.

use chrono::{DateTime, Utc};
use trendbot_core::{Metrics, ProductRecord, RawItem};

use crate::error::ExtractionFailure;
use crate::score::score;

pub(crate) const NAME_KEYS: &[&str] = &["name", "title"];
pub(crate) const URL_KEYS: &[&str] = &["url", "link", "href"];
pub(crate) const IMAGE_KEYS: &[&str] = &["image_url", "image", "img"];
pub(crate) const DESCRIPTION_KEYS: &[&str] = &["description"];
pub(crate) const REVIEW_KEYS: &[&str] = &["reviews", "review_count", "num_reviews", "ratings_count"];
pub(crate) const ORDER_KEYS: &[&str] = &["orders", "sold", "orders_count", "num_orders"];
pub(crate) const VOTE_KEYS: &[&str] = &["votes", "upvotes", "score", "points"];
pub(crate) const COMMENT_KEYS: &[&str] = &["comments", "num_comments", "comment_count"];
pub(crate) const RATING_KEYS: &[&str] = &["rating", "stars", "average_rating"];
pub(crate) const PRICE_KEYS: &[&str] = &["price", "sale_price"];

const MAX_RATING: f64 = 5.0;

/// Records and per-item failures from one listing.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ProductRecord>,
    pub failures: Vec<ExtractionFailure>,
}

impl NormalizedBatch {
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Normalizes one raw item, stamped with the current time.
///
/// # Errors
///
/// Returns [`ExtractionFailure`] with `field = "name"` when no name alias
/// carries a non-blank value.
pub fn normalize(item: &RawItem) -> Result<ProductRecord, ExtractionFailure> {
    normalize_at(item, Utc::now())
}

/// Normalizes one raw item with an explicit `scraped_at`.
///
/// # Errors
///
/// Returns [`ExtractionFailure`] with `field = "name"` when no name alias
/// carries a non-blank value.
pub fn normalize_at(
    item: &RawItem,
    scraped_at: DateTime<Utc>,
) -> Result<ProductRecord, ExtractionFailure> {
    let Some(name) = item.first_of(NAME_KEYS) else {
        return Err(ExtractionFailure::new(
            item.platform,
            item.index,
            "name",
            "is missing or blank",
        ));
    };

    let metrics = Metrics {
        reviews: count_field(item, REVIEW_KEYS),
        orders: count_field(item, ORDER_KEYS),
        votes: count_field(item, VOTE_KEYS),
        comments: count_field(item, COMMENT_KEYS),
        rating: item.first_of(RATING_KEYS).and_then(parse_rating).unwrap_or(0.0),
    };

    let description = item
        .first_of(DESCRIPTION_KEYS)
        .map_or_else(|| format!("Discovered via {}", item.platform), str::to_string);

    Ok(ProductRecord {
        platform: item.platform,
        name: name.to_string(),
        url: item.first_of(URL_KEYS).map(str::to_string),
        image_url: item.first_of(IMAGE_KEYS).map(str::to_string),
        description: Some(description),
        price: item.first_of(PRICE_KEYS).and_then(parse_price),
        scraped_at,
        trend_score: score(&metrics),
        metrics,
    })
}

/// Normalizes a listing, splitting successes from extraction failures.
///
/// Every record in the batch shares one `scraped_at`.
pub fn normalize_batch<I>(items: I) -> NormalizedBatch
where
    I: IntoIterator<Item = Result<RawItem, ExtractionFailure>>,
{
    let scraped_at = Utc::now();
    let mut batch = NormalizedBatch::default();
    for item in items {
        match item.and_then(|raw| normalize_at(&raw, scraped_at)) {
            Ok(record) => batch.records.push(record),
            Err(failure) => {
                tracing::warn!(
                    platform = %failure.platform,
                    index = failure.index,
                    field = %failure.field,
                    reason = %failure.reason,
                    "item skipped"
                );
                batch.failures.push(failure);
            }
        }
    }
    batch
}

fn count_field(item: &RawItem, keys: &[&str]) -> i64 {
    item.first_of(keys).and_then(parse_count).unwrap_or(0)
}

/// Parses engagement counts such as `"1,234"`, `"1,234 sold"`, `"2.3k points"`
/// or `"1.2M"`. Leading non-digits are skipped.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_count(raw: &str) -> Option<i64> {
    let lower = raw.trim().to_ascii_lowercase();
    let (value, rest) = leading_number(&lower, true)?;
    let multiplier = match rest.chars().next() {
        Some('k') => 1_000.0,
        Some('m') => 1_000_000.0,
        _ => 1.0,
    };
    let scaled = (value * multiplier).round();
    // i64::MAX is not exactly representable; stay strictly below it.
    (scaled.is_finite() && scaled < 9.0e18).then_some(scaled as i64)
}

/// Parses the leading number of `"4.5 out of 5 stars"`, clamped to `[0, 5]`.
#[must_use]
pub fn parse_rating(raw: &str) -> Option<f64> {
    let (value, _) = leading_number(raw.trim(), false)?;
    Some(value.clamp(0.0, MAX_RATING))
}

/// Parses the first amount in `"$19.99"`, `"US $1,299.00"` or
/// `"$12.99 - $15.99"`.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let (value, _) = leading_number(raw.trim(), true)?;
    Some(value)
}

/// Finds the first run of digits (with `.` and optionally `,` separators),
/// returning its value and the text after it.
fn leading_number(text: &str, allow_commas: bool) -> Option<(f64, &str)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = &text[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || (allow_commas && c == ',')))
        .unwrap_or(tail.len());
    let digits: String = tail[..end].chars().filter(|c| *c != ',').collect();
    let digits = digits.trim_end_matches('.');
    let value: f64 = digits.parse().ok()?;
    value.is_finite().then_some((value, &tail[end..]))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
