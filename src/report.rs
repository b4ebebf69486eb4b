use std::fmt::Write;

use crate::comparison::compare_periods;
use crate::dates::format_period;
use crate::metrics::Analytics;
use crate::models::DateRange;
use crate::recommendations::recommendations;

fn signed(change: i64) -> String {
    if change > 0 {
        format!("+{change}%")
    } else {
        format!("{change}%")
    }
}

pub fn build_report(analytics: &Analytics<'_>, range: &DateRange) -> String {
    let summary = analytics.summary(range);
    let funnel = analytics.dropoff_funnel(range);
    let comparison = compare_periods(analytics, range);
    let recs = recommendations(analytics, range);

    let mut output = String::new();

    let _ = writeln!(output, "# Brand Metrics Report");
    let _ = writeln!(output, "Period: {}", format_period(range));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Avatars created: {}", summary.total_avatars);
    let _ = writeln!(output, "- Try-ons completed: {}", summary.total_tryons);
    let _ = writeln!(output, "- Avatar completion rate: {}%", summary.avatar_completion_rate);
    let _ = writeln!(output, "- Try-on conversion rate: {}%", summary.tryon_conversion_rate);
    let _ = writeln!(output, "- SKU coverage: {}%", summary.sku_coverage);
    let _ = writeln!(output, "- Avg try-on latency: {}ms", summary.avg_latency_ms);
    let _ = writeln!(output, "- Try-on error rate: {}%", summary.error_rate);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Drop-off Funnel");
    for stage in &funnel {
        let _ = writeln!(
            output,
            "- {}: {} shoppers ({}%)",
            stage.stage, stage.count, stage.percentage
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Period Comparison ({} vs {})",
        comparison.current.period, comparison.previous.period
    );
    let changes = &comparison.changes;
    let _ = writeln!(output, "- Avatars: {}", signed(changes.avatars));
    let _ = writeln!(output, "- Try-ons: {}", signed(changes.tryons));
    let _ = writeln!(output, "- Completion rate: {}", signed(changes.completion_rate));
    let _ = writeln!(output, "- Conversion rate: {}", signed(changes.conversion_rate));
    let _ = writeln!(output, "- Avg latency: {}", signed(changes.avg_latency_ms));
    let _ = writeln!(output, "- Error rate: {}", signed(changes.error_rate));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    if recs.is_empty() {
        let _ = writeln!(output, "No recommendations for this period.");
    } else {
        for rec in &recs {
            let _ = writeln!(
                output,
                "- [{}] {} ({}: {})",
                rec.severity.as_str(),
                rec.title,
                rec.metric,
                rec.value
            );
            let _ = writeln!(output, "  - {}", rec.action);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::fixtures::sample_dataset;

    #[test]
    fn report_lists_every_section() {
        let dataset = sample_dataset();
        let report = build_report(&Analytics::new(&dataset), &DateRange::all_time());

        assert!(report.starts_with("# Brand Metrics Report\nPeriod: All Time\n"));
        assert!(report.contains("- Avatar completion rate: 75%"));
        assert!(report.contains("- Purchase: 1 shoppers (10%)"));
        assert!(report.contains("## Period Comparison (All Time vs All Time)"));
        assert!(report.contains("[medium] Low Purchase Conversion (Purchase Rate: 10%)"));
    }

    #[test]
    fn signs_positive_changes() {
        assert_eq!(signed(12), "+12%");
        assert_eq!(signed(0), "0%");
        assert_eq!(signed(-4), "-4%");
    }

    #[test]
    fn empty_dataset_still_renders() {
        let dataset = Dataset::default();
        let report = build_report(&Analytics::new(&dataset), &DateRange::all_time());
        assert!(report.contains("- Started Onboarding: 0 shoppers (0%)"));
    }
}
