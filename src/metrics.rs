use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::dataset::Dataset;
use crate::dates::{
    calculate_change, filter_by_date_range, group_by_day, mean_ms, percent, previous_period_range,
};
use crate::models::{
    AvatarMetrics, CategoryCount, CategoryCoverage, CountryCount, DailyCount, DateRange,
    ErrorPoint, EventType, FunnelStage, GenderCount, LatencyPoint, PerformanceMetrics, Product,
    ProductCategory, ProductMetrics, RangeCount, ShopperMetrics, SizeCount, SummaryMetrics,
    SummaryTrends, TopProduct, TryonMetrics,
};

const TOP_PRODUCT_LIMIT: usize = 10;

const HEIGHT_BINS: [(&str, u32, u32); 5] = [
    ("150-159cm", 150, 159),
    ("160-169cm", 160, 169),
    ("170-179cm", 170, 179),
    ("180-189cm", 180, 189),
    ("190+cm", 190, u32::MAX),
];

const AGE_BINS: [(&str, u32, u32); 4] = [
    ("18-24", 18, 24),
    ("25-34", 25, 34),
    ("35-44", 35, 44),
    ("45+", 45, u32::MAX),
];

const SIZE_ORDER: [&str; 12] = [
    "XS", "S", "M", "L", "XL", "XXL", "28", "30", "32", "34", "36", "38",
];

const FUNNEL_STAGES: [(&str, EventType); 5] = [
    ("Started Onboarding", EventType::OnboardingStarted),
    ("Photo Uploaded", EventType::PhotoUploaded),
    ("Avatar Created", EventType::AvatarCreated),
    ("Try-on Completed", EventType::TryonCompleted),
    ("Purchase", EventType::Purchase),
];

/// Position of a size label in the canonical ordering; unknown labels sort last.
fn size_rank(size: &str) -> usize {
    SIZE_ORDER
        .iter()
        .position(|known| *known == size)
        .unwrap_or(SIZE_ORDER.len())
}

/// Occurrence counts keyed in first-seen order.
fn count_in_order<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts
}

fn binned(values: &[u32], bins: &[(&str, u32, u32)]) -> Vec<RangeCount> {
    bins.iter()
        .map(|(label, min, max)| RangeCount {
            range: label.to_string(),
            count: values.iter().filter(|v| (*min..=*max).contains(*v)).count(),
        })
        .collect()
}

/// Read-only metric aggregations over an injected dataset.
pub struct Analytics<'a> {
    dataset: &'a Dataset,
}

impl<'a> Analytics<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn product_index(&self) -> HashMap<&'a str, &'a Product> {
        self.dataset
            .products
            .iter()
            .map(|product| (product.id.as_str(), product))
            .collect()
    }

    fn catalog_coverage(&self) -> (usize, usize, u32) {
        let total = self.dataset.products.len();
        let enabled = self.dataset.products.iter().filter(|p| p.enabled).count();
        (total, enabled, percent(enabled, total))
    }

    fn completion_rate(&self, range: &DateRange) -> u32 {
        let shoppers = filter_by_date_range(&self.dataset.shoppers, range);
        let completed = shoppers.iter().filter(|s| s.completed_onboarding).count();
        percent(completed, shoppers.len())
    }

    fn summary_for(&self, range: &DateRange) -> SummaryMetrics {
        let avatars = filter_by_date_range(&self.dataset.avatars, range);
        let tryons = filter_by_date_range(&self.dataset.tryons, range);

        let successful_avatars = avatars.iter().filter(|a| a.success).count();
        let successful_tryons: Vec<_> = tryons.iter().filter(|t| t.success).collect();
        let tryon_avatars: HashSet<&str> = tryons.iter().map(|t| t.avatar_id.as_str()).collect();
        let (_, _, sku_coverage) = self.catalog_coverage();

        SummaryMetrics {
            total_avatars: successful_avatars,
            total_tryons: successful_tryons.len(),
            avatar_completion_rate: self.completion_rate(range),
            tryon_conversion_rate: percent(tryon_avatars.len(), successful_avatars),
            sku_coverage,
            avg_latency_ms: mean_ms(successful_tryons.iter().map(|t| t.generation_time_ms)),
            error_rate: percent(tryons.len() - successful_tryons.len(), tryons.len()),
            trends: SummaryTrends {
                avatars: 0,
                tryons: 0,
                completion_rate: 0,
            },
        }
    }

    /// Headline KPIs, with trends measured against the preceding period.
    pub fn summary(&self, range: &DateRange) -> SummaryMetrics {
        let mut summary = self.summary_for(range);
        let previous = self.summary_for(&previous_period_range(range));

        summary.trends = SummaryTrends {
            avatars: calculate_change(summary.total_avatars as f64, previous.total_avatars as f64),
            tryons: calculate_change(summary.total_tryons as f64, previous.total_tryons as f64),
            completion_rate: calculate_change(
                f64::from(summary.avatar_completion_rate),
                f64::from(previous.avatar_completion_rate),
            ),
        };
        summary
    }

    pub fn avatars(&self, range: &DateRange) -> AvatarMetrics {
        let avatars = filter_by_date_range(&self.dataset.avatars, range);
        let successful = avatars.iter().filter(|a| a.success).count();

        let timeline = group_by_day(avatars.iter().copied())
            .into_iter()
            .map(|(date, items)| DailyCount {
                date,
                count: items.iter().filter(|a| a.success).count(),
            })
            .collect();

        AvatarMetrics {
            total: avatars.len(),
            successful,
            failed: avatars.len() - successful,
            completion_rate: self.completion_rate(range),
            avg_generation_time_ms: mean_ms(
                avatars
                    .iter()
                    .filter(|a| a.success)
                    .map(|a| a.generation_time_ms),
            ),
            timeline,
        }
    }

    pub fn tryons(&self, range: &DateRange) -> TryonMetrics {
        let tryons = filter_by_date_range(&self.dataset.tryons, range);
        let successful: Vec<_> = tryons.iter().copied().filter(|t| t.success).collect();
        let products = self.product_index();

        let mut per_category: HashMap<ProductCategory, usize> = HashMap::new();
        for tryon in &successful {
            if let Some(product) = products.get(tryon.product_id.as_str()) {
                *per_category.entry(product.category).or_default() += 1;
            }
        }
        let by_category = ProductCategory::ALL
            .iter()
            .map(|category| CategoryCount {
                category: category.label().to_string(),
                count: per_category.get(category).copied().unwrap_or(0),
            })
            .collect();

        let timeline = group_by_day(tryons.iter().copied())
            .into_iter()
            .map(|(date, items)| DailyCount {
                date,
                count: items.iter().filter(|t| t.success).count(),
            })
            .collect();

        let users: HashSet<&str> = successful.iter().map(|t| t.avatar_id.as_str()).collect();
        let avg_per_user = if users.is_empty() {
            0.0
        } else {
            ((successful.len() as f64 / users.len() as f64) * 10.0).round() / 10.0
        };

        TryonMetrics {
            total: tryons.len(),
            successful: successful.len(),
            failed: tryons.len() - successful.len(),
            avg_generation_time_ms: mean_ms(successful.iter().map(|t| t.generation_time_ms)),
            by_category,
            timeline,
            avg_per_user,
        }
    }

    /// Catalog coverage is computed over the whole catalog; only the
    /// try-on ranking honors the range.
    pub fn products(&self, range: &DateRange) -> ProductMetrics {
        let (total_products, enabled_products, sku_coverage) = self.catalog_coverage();
        let catalog = &self.dataset.products;

        let by_category = ProductCategory::ALL
            .iter()
            .map(|&category| CategoryCoverage {
                category: category.label().to_string(),
                total: catalog.iter().filter(|p| p.category == category).count(),
                enabled: catalog
                    .iter()
                    .filter(|p| p.category == category && p.enabled)
                    .count(),
            })
            .collect();

        let tryons = filter_by_date_range(&self.dataset.tryons, range);
        let mut counts = count_in_order(
            tryons
                .iter()
                .filter(|t| t.success)
                .map(|t| t.product_id.as_str()),
        );
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let products = self.product_index();
        let top_products = counts
            .into_iter()
            .take(TOP_PRODUCT_LIMIT)
            .map(|(id, tryons)| TopProduct {
                id: id.to_string(),
                name: products
                    .get(id)
                    .map_or_else(|| "Unknown".to_string(), |p| p.name.clone()),
                tryons,
            })
            .collect();

        ProductMetrics {
            total_products,
            enabled_products,
            sku_coverage,
            by_category,
            top_products,
        }
    }

    pub fn shoppers(&self, range: &DateRange) -> ShopperMetrics {
        let shoppers = filter_by_date_range(&self.dataset.shoppers, range);
        let size_recs = filter_by_date_range(&self.dataset.size_recommendations, range);

        let heights: Vec<u32> = shoppers.iter().map(|s| s.height_cm).collect();
        let ages: Vec<u32> = shoppers.iter().map(|s| s.age).collect();

        let gender_distribution = count_in_order(shoppers.iter().map(|s| s.gender))
            .into_iter()
            .map(|(gender, count)| GenderCount {
                gender: gender.label().to_string(),
                count,
            })
            .collect();

        let mut countries = count_in_order(shoppers.iter().map(|s| s.country.as_str()));
        countries.sort_by(|a, b| b.1.cmp(&a.1));
        let country_distribution = countries
            .into_iter()
            .map(|(country, count)| CountryCount {
                country: country.to_string(),
                count,
            })
            .collect();

        let mut sizes = count_in_order(size_recs.iter().map(|r| r.recommended_size.as_str()));
        sizes.sort_by_key(|(size, _)| size_rank(size));
        let size_recommendations = sizes
            .into_iter()
            .map(|(size, count)| SizeCount {
                size: size.to_string(),
                count,
            })
            .collect();

        ShopperMetrics {
            total: shoppers.len(),
            completed_onboarding: shoppers.iter().filter(|s| s.completed_onboarding).count(),
            height_distribution: binned(&heights, &HEIGHT_BINS),
            age_distribution: binned(&ages, &AGE_BINS),
            gender_distribution,
            country_distribution,
            size_recommendations,
        }
    }

    pub fn performance(&self, range: &DateRange) -> PerformanceMetrics {
        let avatars = filter_by_date_range(&self.dataset.avatars, range);
        let tryons = filter_by_date_range(&self.dataset.tryons, range);

        let successful_avatars = avatars.iter().filter(|a| a.success).count();
        let successful_tryons = tryons.iter().filter(|t| t.success).count();

        let avatars_by_day = group_by_day(avatars.iter().copied());
        let tryons_by_day = group_by_day(tryons.iter().copied());
        let days: BTreeSet<&String> = avatars_by_day.keys().chain(tryons_by_day.keys()).collect();

        let mut latency_timeline = Vec::with_capacity(days.len());
        let mut error_timeline = Vec::with_capacity(days.len());
        for day in days {
            let day_avatars = avatars_by_day.get(day).map(Vec::as_slice).unwrap_or(&[]);
            let day_tryons = tryons_by_day.get(day).map(Vec::as_slice).unwrap_or(&[]);

            latency_timeline.push(LatencyPoint {
                date: day.clone(),
                avatar: mean_ms(
                    day_avatars
                        .iter()
                        .filter(|a| a.success)
                        .map(|a| a.generation_time_ms),
                ),
                tryon: mean_ms(
                    day_tryons
                        .iter()
                        .filter(|t| t.success)
                        .map(|t| t.generation_time_ms),
                ),
            });
            error_timeline.push(ErrorPoint {
                date: day.clone(),
                avatar_errors: day_avatars.iter().filter(|a| !a.success).count(),
                tryon_errors: day_tryons.iter().filter(|t| !t.success).count(),
            });
        }

        PerformanceMetrics {
            avg_avatar_latency_ms: mean_ms(
                avatars
                    .iter()
                    .filter(|a| a.success)
                    .map(|a| a.generation_time_ms),
            ),
            avg_tryon_latency_ms: mean_ms(
                tryons
                    .iter()
                    .filter(|t| t.success)
                    .map(|t| t.generation_time_ms),
            ),
            avatar_error_rate: percent(avatars.len() - successful_avatars, avatars.len()),
            tryon_error_rate: percent(tryons.len() - successful_tryons, tryons.len()),
            latency_timeline,
            error_timeline,
        }
    }

    /// Distinct shoppers reaching each funnel stage, relative to the first stage.
    pub fn dropoff_funnel(&self, range: &DateRange) -> Vec<FunnelStage> {
        let events = filter_by_date_range(&self.dataset.events, range);

        let counts: Vec<(&str, usize)> = FUNNEL_STAGES
            .iter()
            .map(|&(stage, event_type)| {
                let shoppers: HashSet<&str> = events
                    .iter()
                    .filter(|e| e.event_type == event_type)
                    .map(|e| e.shopper_id.as_str())
                    .collect();
                (stage, shoppers.len())
            })
            .collect();

        let started = counts[0].1.max(1);
        counts
            .into_iter()
            .map(|(stage, count)| FunnelStage {
                stage: stage.to_string(),
                count,
                percentage: percent(count, started),
            })
            .collect()
    }
}
