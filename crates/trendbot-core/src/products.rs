use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Platform;

/// The raw field dictionary a scraper extracted from one listing element.
///
/// Field names are platform-specific (`"review_count"` on one site,
/// `"num_reviews"` on another); normalization maps them onto [`Metrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub platform: Platform,
    /// Zero-based position of the element in the listing.
    pub index: usize,
    pub fields: BTreeMap<String, String>,
}

impl RawItem {
    #[must_use]
    pub fn new(platform: Platform, index: usize) -> Self {
        Self {
            platform,
            index,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly useful in tests and fixtures.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the first non-blank value among `keys`, in order.
    #[must_use]
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Canonical engagement counters for a product. Missing values are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub reviews: i64,
    pub orders: i64,
    pub votes: i64,
    pub comments: i64,
    /// Star rating in `[0.0, 5.0]`.
    pub rating: f64,
}

/// A normalized product as stored in the `products` table.
///
/// The natural key is `(platform, name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub platform: Platform,
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub scraped_at: DateTime<Utc>,
    pub metrics: Metrics,
    /// Derived from `metrics` at normalization time.
    pub trend_score: f64,
}
