use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Anything carrying a creation instant that date-range filtering and day grouping can read.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOffStage {
    None,
    Started,
    PhotoUpload,
    AvatarGeneration,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "tops")]
    Tops,
    #[serde(rename = "bottoms")]
    Bottoms,
    #[serde(rename = "one-pieces")]
    OnePieces,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 3] = [
        ProductCategory::Tops,
        ProductCategory::Bottoms,
        ProductCategory::OnePieces,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::Tops => "Tops",
            ProductCategory::Bottoms => "Bottoms",
            ProductCategory::OnePieces => "One-pieces",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OnboardingStarted,
    PhotoUploaded,
    AvatarCreated,
    TryonCompleted,
    Purchase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shopper {
    pub id: String,
    pub gender: Gender,
    pub height_cm: u32,
    pub age: u32,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub completed_onboarding: bool,
    pub drop_off_stage: DropOffStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub id: String,
    pub shopper_id: String,
    pub created_at: DateTime<Utc>,
    pub generation_time_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: ProductCategory,
    pub brand: String,
    pub enabled: bool,
    pub available_sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOn {
    pub id: String,
    pub avatar_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
    pub generation_time_ms: u64,
    pub success: bool,
    pub angles_generated: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRecommendation {
    pub id: String,
    pub shopper_id: String,
    pub product_id: String,
    pub recommended_size: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub shopper_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

macro_rules! impl_timestamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timestamped for $ty {
                fn created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }
            }
        )*
    };
}

impl_timestamped!(Shopper, Avatar, TryOn, SizeRecommendation, Event);

/// Inclusive reporting window; a missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn all_time() -> Self {
        Self::default()
    }

    /// Both bounds, or `None` when the range is open on either side.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTrends {
    pub avatars: i64,
    pub tryons: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_avatars: usize,
    pub total_tryons: usize,
    pub avatar_completion_rate: u32,
    pub tryon_conversion_rate: u32,
    pub sku_coverage: u32,
    pub avg_latency_ms: u64,
    pub error_rate: u32,
    pub trends: SummaryTrends,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarMetrics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub completion_rate: u32,
    pub avg_generation_time_ms: u64,
    pub timeline: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryonMetrics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_generation_time_ms: u64,
    pub by_category: Vec<CategoryCount>,
    pub timeline: Vec<DailyCount>,
    pub avg_per_user: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCoverage {
    pub category: String,
    pub total: usize,
    pub enabled: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub id: String,
    pub name: String,
    pub tryons: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetrics {
    pub total_products: usize,
    pub enabled_products: usize,
    pub sku_coverage: u32,
    pub by_category: Vec<CategoryCoverage>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeCount {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeCount {
    pub size: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopperMetrics {
    pub total: usize,
    pub completed_onboarding: usize,
    pub height_distribution: Vec<RangeCount>,
    pub age_distribution: Vec<RangeCount>,
    pub gender_distribution: Vec<GenderCount>,
    pub country_distribution: Vec<CountryCount>,
    pub size_recommendations: Vec<SizeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyPoint {
    pub date: String,
    pub avatar: u64,
    pub tryon: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPoint {
    pub date: String,
    pub avatar_errors: usize,
    pub tryon_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub avg_avatar_latency_ms: u64,
    pub avg_tryon_latency_ms: u64,
    pub avatar_error_rate: u32,
    pub tryon_error_rate: u32,
    pub latency_timeline: Vec<LatencyPoint>,
    pub error_timeline: Vec<ErrorPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub period: String,
    pub avatars: usize,
    pub tryons: usize,
    pub completion_rate: u32,
    pub conversion_rate: u32,
    pub avg_latency_ms: u64,
    pub error_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChanges {
    pub avatars: i64,
    pub tryons: i64,
    pub completion_rate: i64,
    pub conversion_rate: i64,
    pub avg_latency_ms: i64,
    pub error_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMetrics {
    pub current: PeriodSnapshot,
    pub previous: PeriodSnapshot,
    pub changes: PeriodChanges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Engagement,
    Catalog,
    Technical,
    Sizing,
}

impl RecommendationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationCategory::Engagement => "engagement",
            RecommendationCategory::Catalog => "catalog",
            RecommendationCategory::Technical => "technical",
            RecommendationCategory::Sizing => "sizing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub severity: Severity,
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    pub metric: String,
    pub value: String,
    pub action: String,
}
