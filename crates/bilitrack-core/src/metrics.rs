//! Derived-metric formulas shared by the tracker and the channel labeler.

/// Views per elapsed hour since upload, with elapsed floored at 1 hour so a
/// fresh upload never divides by zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn view_velocity(views: i64, checkpoint_hours: i32) -> f64 {
    views as f64 / f64::from(checkpoint_hours.max(1))
}

/// Engagement rate: (likes + coins + favorites) / views.
///
/// A video with no views has no meaningful engagement; returns 0.0 rather
/// than dividing by a floored denominator.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(likes: i64, coins: i64, favorites: i64, views: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let total = likes.saturating_add(coins).saturating_add(favorites);
    total as f64 / views as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_views_per_hour() {
        let v = view_velocity(2_400, 24);
        assert!((v - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn velocity_with_zero_views_is_zero() {
        let v = view_velocity(0, 1);
        assert!(v.abs() < f64::EPSILON);
    }

    #[test]
    fn velocity_floors_elapsed_at_one_hour() {
        let v = view_velocity(150, 0);
        assert!((v - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_is_exact_for_round_numbers() {
        let rate = engagement_rate(500, 200, 300, 10_000);
        assert!((rate - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_with_zero_views_is_zero() {
        let rate = engagement_rate(10, 5, 2, 0);
        assert!(rate.abs() < f64::EPSILON);
    }
}
