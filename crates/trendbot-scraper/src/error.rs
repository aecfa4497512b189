use std::time::Duration;

use thiserror::Error;
use trendbot_core::Platform;

/// Failure reported by a [`crate::BrowserSession`] implementation.
///
/// Carries no platform context; scrapers map it into [`ScraperError`].
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("none of [{selectors}] appeared within {}s", .after.as_secs())]
    Timeout { selectors: String, after: Duration },

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("session already closed")]
    Closed,
}

/// Source-level failure: the listing page could not be loaded or read.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("navigation to {url} failed for {platform}: {reason}")]
    Navigation {
        platform: Platform,
        url: String,
        reason: String,
    },

    #[error("timed out after {secs}s waiting for '{selector}' on {url} ({platform})")]
    Timeout {
        platform: Platform,
        url: String,
        selector: String,
        secs: u64,
    },

    #[error("{platform} served a CAPTCHA or robot check at {url}")]
    Blocked { platform: Platform, url: String },

    #[error("could not open browser session: {0}")]
    Launch(String),
}

impl ScraperError {
    /// Short machine-friendly label used in logs and audit rows.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Navigation { .. } => "navigation",
            ScraperError::Timeout { .. } => "timeout",
            ScraperError::Blocked { .. } => "blocked",
            ScraperError::Launch(_) => "launch",
        }
    }
}

/// Item-level failure: one listing element could not be turned into a record.
///
/// Skipped and counted; never aborts the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{platform} item {index}: field '{field}' {reason}")]
pub struct ExtractionFailure {
    pub platform: Platform,
    pub index: usize,
    pub field: String,
    pub reason: String,
}

impl ExtractionFailure {
    #[must_use]
    pub fn new(platform: Platform, index: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            platform,
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
