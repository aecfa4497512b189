//! Deterministic trend score.
//!
//! Rewards early traction and penalizes saturation. Review and order counts
//! add score up to their knee, then subtract as they keep growing. Reviews
//! peak early; orders are allowed to climb further before they count against
//! a product.

use trendbot_core::Metrics;

const BASE: f64 = 10.0;
const REVIEW_WEIGHT: f64 = 4.0;
const ORDER_WEIGHT: f64 = 4.0;
const VOTE_WEIGHT: f64 = 3.0;
const COMMENT_WEIGHT: f64 = 0.5;
const RATING_WEIGHT: f64 = 10.0;
/// Ratings at or below this earn nothing.
const RATING_FLOOR: f64 = 3.5;
/// Review count past which a product reads as established.
const REVIEW_KNEE: f64 = 500.0;
/// Order count past which a product reads as saturated.
const ORDER_KNEE: f64 = 2000.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Scores `metrics` into `[0, 100]`. Pure: identical metrics give identical
/// scores.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(metrics: &Metrics) -> f64 {
    let reviews = metrics.reviews.max(0) as f64;
    let orders = metrics.orders.max(0) as f64;
    let votes = metrics.votes.max(0) as f64;
    let comments = metrics.comments.max(0) as f64;
    let rating = if metrics.rating.is_finite() {
        metrics.rating
    } else {
        0.0
    };

    let raw = BASE
        + REVIEW_WEIGHT * traction(reviews, REVIEW_KNEE)
        + ORDER_WEIGHT * traction(orders, ORDER_KNEE)
        + VOTE_WEIGHT * votes.ln_1p()
        + COMMENT_WEIGHT * comments.ln_1p()
        + RATING_WEIGHT * (rating - RATING_FLOOR).max(0.0);

    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Log growth up to `knee`, then a log penalty on the excess.
fn traction(x: f64, knee: f64) -> f64 {
    let below = x.min(knee);
    let excess = (x - knee).max(0.0);
    below.ln_1p() - 2.0 * (excess / knee).ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(reviews: i64, orders: i64, votes: i64, comments: i64, rating: f64) -> Metrics {
        Metrics {
            reviews,
            orders,
            votes,
            comments,
            rating,
        }
    }

    #[test]
    fn empty_metrics_score_base() {
        assert!((score(&Metrics::default()) - BASE).abs() < 1e-9);
    }

    #[test]
    fn score_is_deterministic() {
        let m = metrics(120, 40, 3, 9, 4.5);
        assert_eq!(score(&m).to_bits(), score(&m).to_bits());
    }

    #[test]
    fn more_reviews_below_knee_score_higher() {
        let widget = metrics(120, 40, 0, 0, 4.5);
        let fewer = metrics(10, 40, 0, 0, 4.5);
        assert!(score(&widget) > score(&fewer));
    }

    #[test]
    fn widget_example_score() {
        let widget = metrics(120, 40, 0, 0, 4.5);
        let expected = 10.0 + 4.0 * 121_f64.ln() + 4.0 * 41_f64.ln() + 10.0;
        assert!((score(&widget) - expected).abs() < 1e-9);
    }

    #[test]
    fn review_score_peaks_early_then_declines() {
        let early = score(&metrics(120, 0, 0, 0, 0.0));
        let established = score(&metrics(1999, 0, 0, 0, 0.0));
        let saturated = score(&metrics(10_001, 0, 0, 0, 0.0));
        assert!(early > established, "{early} <= {established}");
        assert!(established > saturated, "{established} <= {saturated}");
    }

    #[test]
    fn orders_climb_past_the_review_knee() {
        let some = score(&metrics(0, 500, 0, 0, 0.0));
        let more = score(&metrics(0, 1999, 0, 0, 0.0));
        assert!(more > some);
    }

    #[test]
    fn saturation_lowers_score() {
        let at_knee = metrics(2000, 0, 0, 0, 0.0);
        let saturated = metrics(20_000, 0, 0, 0, 0.0);
        assert!(score(&saturated) < score(&at_knee));
    }

    #[test]
    fn rating_below_floor_adds_nothing() {
        let low = metrics(0, 0, 0, 0, 3.0);
        assert!((score(&low) - BASE).abs() < 1e-9);
    }

    #[test]
    fn score_is_clamped_to_range() {
        let huge = metrics(2000, 2000, 10_000_000, 10_000_000, 5.0);
        assert!((score(&huge) - MAX_SCORE).abs() < f64::EPSILON);

        let crushed = metrics(i64::MAX, i64::MAX, 0, 0, 0.0);
        assert!(score(&crushed).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_and_nan_inputs_are_neutral() {
        let odd = metrics(-5, -1, -100, -3, f64::NAN);
        assert!((score(&odd) - BASE).abs() < 1e-9);
    }
}
