//! Shared listing-scrape flow driven by per-platform [`SiteProfile`]s.

use std::time::Duration;

use async_trait::async_trait;
use trendbot_core::{Platform, RawItem};

use crate::browser::BrowserSession;
use crate::dom::{element_attribute, element_text, Snapshot};
use crate::error::{BrowserError, ExtractionFailure, ScraperError};

/// Lowercased page markers of a CAPTCHA or bot-check interstitial.
const BLOCK_MARKERS: &[&str] = &["captcha", "robot check"];

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub listing_url: String,
    pub max_items: usize,
    /// Upper bound on waiting for the listing container to render.
    pub timeout: Duration,
}

/// Extraction results for one listing, handed out once in page order.
///
/// Items are extracted eagerly while the page snapshot is alive, since
/// `scraper::Html` is not `Send` and cannot be held across an `.await`.
/// Not `Clone`: once consumed it cannot be restarted.
#[derive(Debug)]
pub struct Listing {
    items: std::vec::IntoIter<Result<RawItem, ExtractionFailure>>,
}

impl Listing {
    #[must_use]
    pub fn new(items: Vec<Result<RawItem, ExtractionFailure>>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for Listing {
    type Item = Result<RawItem, ExtractionFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl FromIterator<Result<RawItem, ExtractionFailure>> for Listing {
    fn from_iter<I: IntoIterator<Item = Result<RawItem, ExtractionFailure>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// What one scrape produced: items collected before any navigation failure,
/// plus that failure.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub listing: Listing,
    pub failure: Option<ScraperError>,
    /// Page HTML captured when the scrape failed, for debug dumps.
    pub page_html: Option<String>,
}

impl ScrapeOutcome {
    #[must_use]
    pub fn failed(failure: ScraperError, page_html: Option<String>) -> Self {
        Self {
            listing: Listing::empty(),
            failure: Some(failure),
            page_html,
        }
    }
}

/// One platform's listing scraper.
#[async_trait]
pub trait SourceScraper: Send + Sync {
    fn platform(&self) -> Platform;

    /// Scrapes one listing page. Never returns `Err`: navigation problems are
    /// reported in [`ScrapeOutcome::failure`].
    async fn scrape(&self, session: &mut dyn BrowserSession, options: &ScrapeOptions)
        -> ScrapeOutcome;
}

/// Where a field's value lives inside a listing element.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    Text,
    Attr(&'static str),
    /// An `href`-like attribute, absolutized against the platform origin.
    Link(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Raw field name stored in [`RawItem::fields`].
    pub key: &'static str,
    pub selector: &'static str,
    pub source: FieldSource,
}

/// Selectors describing one platform's listing page.
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub platform: Platform,
    /// Any of these marks a rendered listing.
    pub ready_selectors: &'static [&'static str],
    /// One match per listing element. Matches nested inside another match
    /// are ignored.
    pub item_selector: &'static str,
    /// Field whose absence fails the item.
    pub title: FieldSpec,
    pub fields: &'static [FieldSpec],
}

/// Runs the navigate, wait, read, parse sequence for `profile`.
pub async fn scrape_listing(
    profile: &SiteProfile,
    session: &mut dyn BrowserSession,
    options: &ScrapeOptions,
) -> ScrapeOutcome {
    let platform = profile.platform;
    let url = options.listing_url.as_str();

    tracing::info!(platform = %platform, url, "loading listing");
    if let Err(e) = session.navigate(url).await {
        let failure = ScraperError::Navigation {
            platform,
            url: url.to_string(),
            reason: e.to_string(),
        };
        return ScrapeOutcome::failed(failure, None);
    }

    if let Err(e) = session
        .wait_for_selector(profile.ready_selectors, options.timeout)
        .await
    {
        let html = session.page_source().await.ok();
        let failure = match (&e, html.as_deref()) {
            (_, Some(page)) if is_blocked(page) => ScraperError::Blocked {
                platform,
                url: url.to_string(),
            },
            (BrowserError::Timeout { selectors, after }, _) => ScraperError::Timeout {
                platform,
                url: url.to_string(),
                selector: selectors.clone(),
                secs: after.as_secs(),
            },
            _ => ScraperError::Navigation {
                platform,
                url: url.to_string(),
                reason: e.to_string(),
            },
        };
        return ScrapeOutcome::failed(failure, html);
    }

    let html = match session.page_source().await {
        Ok(html) => html,
        Err(e) => {
            let failure = ScraperError::Navigation {
                platform,
                url: url.to_string(),
                reason: e.to_string(),
            };
            return ScrapeOutcome::failed(failure, None);
        }
    };

    if is_blocked(&html) {
        let failure = ScraperError::Blocked {
            platform,
            url: url.to_string(),
        };
        return ScrapeOutcome::failed(failure, Some(html));
    }

    let items = parse_listing(profile, &html, options.max_items);
    tracing::info!(platform = %platform, url, items = items.len(), "listing parsed");

    ScrapeOutcome {
        listing: Listing::new(items),
        failure: None,
        page_html: None,
    }
}

/// Extracts up to `max_items` raw items from rendered listing HTML.
#[must_use]
pub fn parse_listing(
    profile: &SiteProfile,
    html: &str,
    max_items: usize,
) -> Vec<Result<RawItem, ExtractionFailure>> {
    let snapshot = Snapshot::parse(html);
    snapshot
        .find_outermost(profile.item_selector)
        .into_iter()
        .take(max_items)
        .enumerate()
        .map(|(index, element)| {
            let Some(title) = extract(profile.platform, element, &profile.title) else {
                tracing::debug!(
                    platform = %profile.platform,
                    index,
                    selector = profile.title.selector,
                    "listing element has no title"
                );
                return Err(ExtractionFailure::new(
                    profile.platform,
                    index,
                    "name",
                    format!("no element matched '{}'", profile.title.selector),
                ));
            };

            let mut item = RawItem::new(profile.platform, index);
            item.insert(profile.title.key, title);
            for spec in profile.fields {
                if let Some(value) = extract(profile.platform, element, spec) {
                    item.insert(spec.key, value);
                }
            }
            Ok(item)
        })
        .collect()
}

fn extract(platform: Platform, element: scraper::ElementRef<'_>, spec: &FieldSpec) -> Option<String> {
    match spec.source {
        FieldSource::Text => element_text(element, spec.selector),
        FieldSource::Attr(attr) => element_attribute(element, spec.selector, attr),
        FieldSource::Link(attr) => element_attribute(element, spec.selector, attr)
            .map(|href| absolutize(platform, &href)),
    }
}

/// Resolves a scraped link against the platform origin.
///
/// `//host/x` gains `https:`, `/x` gains the origin, anything else is kept.
#[must_use]
pub fn absolutize(platform: Platform, href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{}{href}", platform.origin())
    } else {
        href.to_string()
    }
}

/// True when the page looks like a CAPTCHA or robot-check interstitial.
#[must_use]
pub fn is_blocked(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
