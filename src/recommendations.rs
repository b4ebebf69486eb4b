use crate::metrics::Analytics;
use crate::models::{
    CategoryCount, DateRange, FunnelStage, PerformanceMetrics, ProductMetrics, Recommendation,
    RecommendationCategory, Severity, ShopperMetrics, SummaryMetrics, TryonMetrics,
};

/// Every report the rule battery reads, computed once per call.
pub struct MetricSnapshot {
    pub summary: SummaryMetrics,
    pub tryons: TryonMetrics,
    pub products: ProductMetrics,
    pub shoppers: ShopperMetrics,
    pub performance: PerformanceMetrics,
    pub funnel: Vec<FunnelStage>,
}

impl MetricSnapshot {
    pub fn collect(analytics: &Analytics<'_>, range: &DateRange) -> Self {
        Self {
            summary: analytics.summary(range),
            tryons: analytics.tryons(range),
            products: analytics.products(range),
            shoppers: analytics.shoppers(range),
            performance: analytics.performance(range),
            funnel: analytics.dropoff_funnel(range),
        }
    }
}

type Rule = fn(&MetricSnapshot) -> Option<Recommendation>;

/// Evaluated in this order; ties in severity keep it.
const RULES: [Rule; 9] = [
    completion_rate,
    category_balance,
    sku_coverage,
    tryon_errors,
    tryon_latency,
    tryon_conversion,
    engagement_depth,
    petite_sizing,
    purchase_conversion,
];

#[allow(clippy::too_many_arguments)]
fn recommendation(
    id: &str,
    severity: Severity,
    category: RecommendationCategory,
    title: String,
    description: String,
    metric: &str,
    value: String,
    action: String,
) -> Recommendation {
    Recommendation {
        id: id.to_string(),
        severity,
        category,
        title,
        description,
        metric: metric.to_string(),
        value,
        action,
    }
}

/// Milliseconds rendered as seconds with one decimal. Halves round up only when the
/// binary quotient `ms / 1000` sits on or above the half: `3250` -> `"3.3"`, `3050` -> `"3.0"`.
fn seconds(ms: u64) -> String {
    let mut tenths = ms / 100;
    let rest = ms % 100;
    let quotient = ms as f64 / 1000.0;
    if rest > 50 || (rest == 50 && quotient.mul_add(20.0, -((2 * tenths + 1) as f64)) >= 0.0) {
        tenths += 1;
    }
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn completion_rate(m: &MetricSnapshot) -> Option<Recommendation> {
    let rate = m.summary.avatar_completion_rate;
    if rate >= 70 {
        return None;
    }
    Some(recommendation(
        "rec_completion",
        if rate < 50 { Severity::High } else { Severity::Medium },
        RecommendationCategory::Engagement,
        "Low Avatar Completion Rate".to_string(),
        "Many users are dropping off before completing their avatar. Consider simplifying the \
         onboarding flow or adding progress indicators."
            .to_string(),
        "Avatar Completion Rate",
        format!("{rate}%"),
        "Review onboarding UX and identify friction points in photo upload step".to_string(),
    ))
}

fn category_balance(m: &MetricSnapshot) -> Option<Recommendation> {
    // Later entries win ties, for both extremes.
    let categories = &m.tryons.by_category;
    let best = categories
        .iter()
        .reduce(|a, b| if a.count > b.count { a } else { b })?;
    let worst = categories
        .iter()
        .reduce(|a, b| if a.count < b.count { a } else { b })?;

    if worst.count == 0 || best.count as f64 <= worst.count as f64 * 2.5 {
        return None;
    }

    let CategoryCount { category: weak, .. } = worst;
    let lower = weak.to_lowercase();
    Some(recommendation(
        "rec_category",
        Severity::Medium,
        RecommendationCategory::Catalog,
        format!("{weak} Category Underperforming"),
        format!(
            "{weak} has significantly fewer try-ons compared to {}. Consider featuring more \
             {lower} products or improving their visibility.",
            best.category
        ),
        "Category Try-ons",
        format!("{} vs {}", worst.count, best.count),
        format!("Promote {lower} in homepage carousel or add category-specific campaigns"),
    ))
}

fn sku_coverage(m: &MetricSnapshot) -> Option<Recommendation> {
    let products = &m.products;
    if products.sku_coverage >= 85 {
        return None;
    }
    Some(recommendation(
        "rec_sku",
        if products.sku_coverage < 70 {
            Severity::High
        } else {
            Severity::Low
        },
        RecommendationCategory::Catalog,
        "SKU Coverage Gap".to_string(),
        format!(
            "Only {}% of products are enabled for virtual try-on. Enabling more SKUs could \
             increase engagement.",
            products.sku_coverage
        ),
        "SKU Coverage",
        format!(
            "{}/{} products",
            products.enabled_products, products.total_products
        ),
        "Prioritize enabling top-selling products that are currently disabled".to_string(),
    ))
}

fn tryon_errors(m: &MetricSnapshot) -> Option<Recommendation> {
    let rate = m.performance.tryon_error_rate;
    if rate <= 3 {
        return None;
    }
    Some(recommendation(
        "rec_errors",
        if rate > 5 { Severity::High } else { Severity::Medium },
        RecommendationCategory::Technical,
        "Elevated Try-on Error Rate".to_string(),
        format!(
            "{rate}% of try-ons are failing. This directly impacts user experience and conversion."
        ),
        "Try-on Error Rate",
        format!("{rate}%"),
        "Investigate recent error logs and prioritize fixing garment overlay issues".to_string(),
    ))
}

fn tryon_latency(m: &MetricSnapshot) -> Option<Recommendation> {
    let latency = m.performance.avg_tryon_latency_ms;
    if latency <= 3000 {
        return None;
    }
    let secs = seconds(latency);
    Some(recommendation(
        "rec_latency",
        if latency > 4000 {
            Severity::High
        } else {
            Severity::Medium
        },
        RecommendationCategory::Technical,
        "High Try-on Latency".to_string(),
        format!(
            "Average try-on generation takes {secs}s. Users expect results in under 3 seconds."
        ),
        "Avg Try-on Latency",
        format!("{secs}s"),
        "Consider image optimization, caching, or infrastructure scaling".to_string(),
    ))
}

fn tryon_conversion(m: &MetricSnapshot) -> Option<Recommendation> {
    let rate = m.summary.tryon_conversion_rate;
    if rate >= 80 {
        return None;
    }
    Some(recommendation(
        "rec_tryon_conversion",
        if rate < 60 { Severity::High } else { Severity::Medium },
        RecommendationCategory::Engagement,
        "Users Not Trying On Products".to_string(),
        format!(
            "Only {rate}% of users with avatars have tried on a product. Consider prompting users \
             to try products immediately after avatar creation."
        ),
        "Avatar to Try-on Rate",
        format!("{rate}%"),
        "Add product suggestions after avatar creation, highlight \"Try it on\" buttons"
            .to_string(),
    ))
}

fn engagement_depth(m: &MetricSnapshot) -> Option<Recommendation> {
    let per_user = m.tryons.avg_per_user;
    if per_user >= 2.0 {
        return None;
    }
    Some(recommendation(
        "rec_engagement",
        Severity::Low,
        RecommendationCategory::Engagement,
        "Low Engagement Depth".to_string(),
        format!(
            "Users average only {per_user} try-ons each. Encouraging more try-ons correlates with \
             higher purchase rates."
        ),
        "Avg Try-ons per User",
        per_user.to_string(),
        "Implement \"You might also like\" recommendations after each try-on".to_string(),
    ))
}

fn petite_sizing(m: &MetricSnapshot) -> Option<Recommendation> {
    let sizes = &m.shoppers.size_recommendations;
    let xs = sizes.iter().find(|s| s.size == "XS")?;
    let total: usize = sizes.iter().map(|s| s.count).sum();
    if total == 0 || xs.count as f64 / total as f64 <= 0.08 {
        return None;
    }

    let share = ((xs.count as f64 / total as f64) * 100.0).round();
    Some(recommendation(
        "rec_sizing",
        Severity::Medium,
        RecommendationCategory::Sizing,
        "Size Availability Gap for Petite Shoppers".to_string(),
        format!(
            "{share}% of size recommendations are XS, but some products don't offer this size."
        ),
        "XS Size Requests",
        format!("{} recommendations", xs.count),
        "Ensure XS availability across all product categories, especially tops".to_string(),
    ))
}

fn purchase_conversion(m: &MetricSnapshot) -> Option<Recommendation> {
    let rate = m
        .funnel
        .iter()
        .find(|stage| stage.stage == "Purchase")
        .map_or(0, |stage| stage.percentage);
    if rate >= 15 {
        return None;
    }
    Some(recommendation(
        "rec_purchase",
        if rate < 10 { Severity::High } else { Severity::Medium },
        RecommendationCategory::Engagement,
        "Low Purchase Conversion".to_string(),
        format!(
            "Only {rate}% of users who started onboarding made a purchase. The virtual try-on \
             experience may need optimization."
        ),
        "Purchase Rate",
        format!("{rate}%"),
        "Add \"Buy Now\" CTAs on try-on results, offer first-purchase discounts".to_string(),
    ))
}

/// Runs the rule battery over precomputed reports, most severe first.
pub fn evaluate(snapshot: &MetricSnapshot) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> =
        RULES.iter().filter_map(|rule| rule(snapshot)).collect();
    recommendations.sort_by_key(|rec| rec.severity.rank());

    tracing::debug!(count = recommendations.len(), "recommendation rules evaluated");
    recommendations
}

pub fn recommendations(analytics: &Analytics<'_>, range: &DateRange) -> Vec<Recommendation> {
    evaluate(&MetricSnapshot::collect(analytics, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::dataset::Dataset;
    use crate::fixtures::sample_dataset;
    use crate::models::{SizeCount, SummaryTrends};

    /// Reports that trip none of the rules.
    fn healthy() -> MetricSnapshot {
        let dataset = Dataset::default();
        let analytics = Analytics::new(&dataset);
        let range = DateRange::all_time();
        let mut snapshot = MetricSnapshot::collect(&analytics, &range);

        snapshot.summary = SummaryMetrics {
            total_avatars: 100,
            total_tryons: 300,
            avatar_completion_rate: 85,
            tryon_conversion_rate: 90,
            sku_coverage: 95,
            avg_latency_ms: 2000,
            error_rate: 1,
            trends: SummaryTrends {
                avatars: 0,
                tryons: 0,
                completion_rate: 0,
            },
        };
        snapshot.tryons.avg_per_user = 3.0;
        for entry in &mut snapshot.tryons.by_category {
            entry.count = 50;
        }
        snapshot.products.sku_coverage = 95;
        snapshot.products.enabled_products = 19;
        snapshot.products.total_products = 20;
        snapshot.performance.tryon_error_rate = 1;
        snapshot.performance.avg_tryon_latency_ms = 2000;
        snapshot.funnel[4].percentage = 30;
        snapshot
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn healthy_metrics_raise_nothing() {
        assert!(evaluate(&healthy()).is_empty());
    }

    #[test]
    fn completion_rate_severity_tiers() {
        let mut snapshot = healthy();
        snapshot.summary.avatar_completion_rate = 60;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_completion"]);
        assert_eq!(recs[0].severity, Severity::Medium);
        assert_eq!(recs[0].value, "60%");

        snapshot.summary.avatar_completion_rate = 45;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn category_imbalance_needs_a_nonzero_floor() {
        let mut snapshot = healthy();
        snapshot.tryons.by_category[0].count = 100;
        snapshot.tryons.by_category[2].count = 0;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.tryons.by_category[2].count = 30;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_category"]);
        assert_eq!(recs[0].title, "One-pieces Category Underperforming");
        assert_eq!(recs[0].value, "30 vs 100");
        assert!(recs[0].action.contains("one-pieces"));
    }

    #[test]
    fn sku_coverage_is_low_unless_very_poor() {
        let mut snapshot = healthy();
        snapshot.products.sku_coverage = 80;
        let recs = evaluate(&snapshot);
        assert_eq!(recs[0].severity, Severity::Low);
        assert_eq!(recs[0].value, "19/20 products");

        snapshot.products.sku_coverage = 65;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn latency_is_reported_in_seconds() {
        let mut snapshot = healthy();
        snapshot.performance.avg_tryon_latency_ms = 3250;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_latency"]);
        assert_eq!(recs[0].value, "3.3s");
        assert_eq!(recs[0].severity, Severity::Medium);

        snapshot.performance.avg_tryon_latency_ms = 4200;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn completion_threshold_is_exclusive() {
        let mut snapshot = healthy();
        snapshot.summary.avatar_completion_rate = 70;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.summary.avatar_completion_rate = 69;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.summary.avatar_completion_rate = 50;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.summary.avatar_completion_rate = 49;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn category_ties_pick_the_later_category() {
        let mut snapshot = healthy();
        snapshot.tryons.by_category[0].count = 10;
        snapshot.tryons.by_category[1].count = 10;
        snapshot.tryons.by_category[2].count = 30;
        let recs = evaluate(&snapshot);
        assert_eq!(recs[0].title, "Bottoms Category Underperforming");
        assert_eq!(recs[0].value, "10 vs 30");

        snapshot.tryons.by_category[0].count = 40;
        snapshot.tryons.by_category[1].count = 40;
        snapshot.tryons.by_category[2].count = 12;
        let recs = evaluate(&snapshot);
        assert!(recs[0].description.contains("compared to Bottoms"));
    }

    #[test]
    fn category_imbalance_needs_more_than_two_and_a_half_times() {
        let mut snapshot = healthy();
        snapshot.tryons.by_category[0].count = 50;
        snapshot.tryons.by_category[1].count = 20;
        snapshot.tryons.by_category[2].count = 20;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.tryons.by_category[0].count = 51;
        assert_eq!(ids(&evaluate(&snapshot)), vec!["rec_category"]);
    }

    #[test]
    fn sku_coverage_thresholds() {
        let mut snapshot = healthy();
        snapshot.products.sku_coverage = 85;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.products.sku_coverage = 84;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Low);

        snapshot.products.sku_coverage = 70;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Low);

        snapshot.products.sku_coverage = 69;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn error_rate_tiers() {
        let mut snapshot = healthy();
        snapshot.performance.tryon_error_rate = 3;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.performance.tryon_error_rate = 4;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_errors"]);
        assert_eq!(recs[0].severity, Severity::Medium);
        assert_eq!(recs[0].value, "4%");

        snapshot.performance.tryon_error_rate = 5;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.performance.tryon_error_rate = 6;
        let recs = evaluate(&snapshot);
        assert_eq!(recs[0].severity, Severity::High);
        assert_eq!(recs[0].category, RecommendationCategory::Technical);
    }

    #[test]
    fn latency_thresholds() {
        let mut snapshot = healthy();
        snapshot.performance.avg_tryon_latency_ms = 3000;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.performance.avg_tryon_latency_ms = 3001;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.performance.avg_tryon_latency_ms = 4000;
        let recs = evaluate(&snapshot);
        assert_eq!(recs[0].severity, Severity::Medium);
        assert_eq!(recs[0].value, "4.0s");

        snapshot.performance.avg_tryon_latency_ms = 4001;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn seconds_round_the_binary_quotient() {
        assert_eq!(seconds(3250), "3.3");
        assert_eq!(seconds(3050), "3.0");
        assert_eq!(seconds(3150), "3.1");
        assert_eq!(seconds(3749), "3.7");
        assert_eq!(seconds(3751), "3.8");
        assert_eq!(seconds(12000), "12.0");
    }

    #[test]
    fn tryon_conversion_tiers() {
        let mut snapshot = healthy();
        snapshot.summary.tryon_conversion_rate = 80;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.summary.tryon_conversion_rate = 79;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_tryon_conversion"]);
        assert_eq!(recs[0].severity, Severity::Medium);
        assert_eq!(recs[0].category, RecommendationCategory::Engagement);
        assert_eq!(recs[0].value, "79%");
        assert!(recs[0].description.starts_with("Only 79% of users with avatars"));

        snapshot.summary.tryon_conversion_rate = 60;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.summary.tryon_conversion_rate = 59;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn engagement_depth_threshold_is_exclusive() {
        let mut snapshot = healthy();
        snapshot.tryons.avg_per_user = 2.0;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.tryons.avg_per_user = 1.9;
        assert_eq!(ids(&evaluate(&snapshot)), vec!["rec_engagement"]);
    }

    #[test]
    fn purchase_conversion_tiers() {
        let mut snapshot = healthy();
        snapshot.funnel[4].percentage = 15;
        assert!(evaluate(&snapshot).is_empty());

        snapshot.funnel[4].percentage = 14;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_purchase"]);
        assert_eq!(recs[0].severity, Severity::Medium);
        assert_eq!(recs[0].value, "14%");

        snapshot.funnel[4].percentage = 10;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::Medium);

        snapshot.funnel[4].percentage = 9;
        assert_eq!(evaluate(&snapshot)[0].severity, Severity::High);
    }

    #[test]
    fn engagement_depth_prints_one_decimal() {
        let mut snapshot = healthy();
        snapshot.tryons.avg_per_user = 1.5;
        let recs = evaluate(&snapshot);
        assert_eq!(recs[0].value, "1.5");
        assert_eq!(recs[0].severity, Severity::Low);
    }

    #[test]
    fn petite_sizing_needs_more_than_eight_percent() {
        let mut snapshot = healthy();
        snapshot.shoppers.size_recommendations = vec![
            SizeCount {
                size: "XS".to_string(),
                count: 2,
            },
            SizeCount {
                size: "M".to_string(),
                count: 23,
            },
        ];
        assert!(evaluate(&snapshot).is_empty());

        snapshot.shoppers.size_recommendations[0].count = 3;
        let recs = evaluate(&snapshot);
        assert_eq!(ids(&recs), vec!["rec_sizing"]);
        assert_eq!(recs[0].value, "3 recommendations");
        assert!(recs[0].description.starts_with("12%"));
    }

    #[test]
    fn sorted_by_severity_keeping_rule_order() {
        let mut snapshot = healthy();
        snapshot.summary.avatar_completion_rate = 60;
        snapshot.products.sku_coverage = 50;
        snapshot.performance.tryon_error_rate = 4;
        snapshot.tryons.avg_per_user = 1.0;
        snapshot.funnel[4].percentage = 5;

        let recs = evaluate(&snapshot);
        assert_eq!(
            ids(&recs),
            vec!["rec_sku", "rec_purchase", "rec_completion", "rec_errors", "rec_engagement"]
        );
    }

    #[test]
    fn recommendations_are_well_formed() {
        let dataset = sample_dataset();
        let recs = recommendations(&Analytics::new(&dataset), &DateRange::all_time());

        let unique: HashSet<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(unique.len(), recs.len());
        for pair in recs.windows(2) {
            assert!(pair[0].severity.rank() <= pair[1].severity.rank());
        }
        for rec in &recs {
            assert!(!rec.value.is_empty());
            assert!(!rec.action.is_empty());
        }
        assert!(ids(&recs).contains(&"rec_purchase"));
    }

    #[test]
    fn empty_dataset_still_evaluates() {
        let dataset = Dataset::default();
        let recs = recommendations(&Analytics::new(&dataset), &DateRange::all_time());
        let found = ids(&recs);
        assert!(found.contains(&"rec_completion"));
        assert!(!found.contains(&"rec_category"));
        assert!(!found.contains(&"rec_sizing"));
    }
}
