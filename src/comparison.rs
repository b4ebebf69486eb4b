use crate::dates::{calculate_change, format_period, previous_period_range};
use crate::metrics::Analytics;
use crate::models::{ComparisonMetrics, DateRange, PeriodChanges, PeriodSnapshot};

fn snapshot(analytics: &Analytics<'_>, range: &DateRange) -> PeriodSnapshot {
    let summary = analytics.summary(range);
    let performance = analytics.performance(range);

    PeriodSnapshot {
        period: format_period(range),
        avatars: summary.total_avatars,
        tryons: summary.total_tryons,
        completion_rate: summary.avatar_completion_rate,
        conversion_rate: summary.tryon_conversion_rate,
        avg_latency_ms: performance.avg_tryon_latency_ms,
        error_rate: summary.error_rate,
    }
}

/// Headline metrics for `range` next to the equal-length period before it.
pub fn compare_periods(analytics: &Analytics<'_>, range: &DateRange) -> ComparisonMetrics {
    let previous_range = previous_period_range(range);
    let current = snapshot(analytics, range);
    let previous = snapshot(analytics, &previous_range);

    tracing::debug!(
        current = %current.period,
        previous = %previous.period,
        "comparing periods"
    );

    let changes = PeriodChanges {
        avatars: calculate_change(current.avatars as f64, previous.avatars as f64),
        tryons: calculate_change(current.tryons as f64, previous.tryons as f64),
        completion_rate: calculate_change(
            f64::from(current.completion_rate),
            f64::from(previous.completion_rate),
        ),
        conversion_rate: calculate_change(
            f64::from(current.conversion_rate),
            f64::from(previous.conversion_rate),
        ),
        avg_latency_ms: calculate_change(
            current.avg_latency_ms as f64,
            previous.avg_latency_ms as f64,
        ),
        error_rate: calculate_change(f64::from(current.error_rate), f64::from(previous.error_rate)),
    };

    ComparisonMetrics {
        current,
        previous,
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_dataset;
    use chrono::NaiveDate;

    #[test]
    fn all_time_compares_against_itself() {
        let dataset = sample_dataset();
        let comparison = compare_periods(&Analytics::new(&dataset), &DateRange::all_time());

        assert_eq!(comparison.current.period, "All Time");
        assert_eq!(comparison.previous.period, "All Time");
        assert_eq!(comparison.current, comparison.previous);
        assert_eq!(comparison.changes.avatars, 0);
        assert_eq!(comparison.changes.avg_latency_ms, 0);
    }

    #[test]
    fn week_over_week_changes() {
        let dataset = sample_dataset();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 12, 8),
            NaiveDate::from_ymd_opt(2025, 12, 14),
        );
        let comparison = compare_periods(&Analytics::new(&dataset), &range);

        assert_eq!(comparison.current.period, "Dec 8 - Dec 14");
        assert_eq!(comparison.previous.period, "Dec 1 - Dec 7");
        assert_eq!(comparison.current.avatars, 1);
        assert_eq!(comparison.previous.avatars, 2);
        assert_eq!(comparison.changes.avatars, -50);
        assert_eq!(comparison.current.avg_latency_ms, 3000);
        assert_eq!(comparison.previous.avg_latency_ms, 2333);
        assert_eq!(comparison.changes.avg_latency_ms, 29);
        assert_eq!(comparison.previous.error_rate, 25);
        assert_eq!(comparison.changes.error_rate, -100);
    }
}
