//! Randomized pause between source scrapes.

use std::time::Duration;

use rand::Rng;
use trendbot_core::AppConfig;

/// Inclusive `[min, max]` range a pause is drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min_secs: f64,
    max_secs: f64,
}

impl DelayRange {
    /// Bounds are sorted and negatives or non-finite values become zero.
    #[must_use]
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let (a, b) = (sanitize(min_secs), sanitize(max_secs));
        Self {
            min_secs: a.min(b),
            max_secs: a.max(b),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.delay_min_secs, config.delay_max_secs)
    }

    #[must_use]
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs)
    }

    /// Draws one pause length.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max_secs <= self.min_secs {
            return self.min();
        }
        let secs = rand::rng().random_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }

    /// Sleeps for one sampled pause and returns its length.
    pub async fn sleep(&self) -> Duration {
        let pause = self.sample();
        if !pause.is_zero() {
            tracing::debug!(secs = pause.as_secs_f64(), "pausing between sources");
            tokio::time::sleep(pause).await;
        }
        pause
    }
}
