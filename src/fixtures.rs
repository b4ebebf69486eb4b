//! In-memory records shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::dataset::Dataset;
use crate::models::{
    Avatar, DropOffStage, Event, EventType, Gender, Product, ProductCategory, Shopper,
    SizeRecommendation, TryOn,
};

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, day, hour, 0, 0).unwrap()
}

pub fn shopper(id: &str, day: u32, completed: bool) -> Shopper {
    Shopper {
        id: id.to_string(),
        gender: Gender::Female,
        height_cm: 165,
        age: 29,
        country: "US".to_string(),
        created_at: at(day, 9),
        completed_onboarding: completed,
        drop_off_stage: if completed {
            DropOffStage::Completed
        } else {
            DropOffStage::PhotoUpload
        },
    }
}

pub fn avatar(id: &str, day: u32, generation_time_ms: u64, success: bool) -> Avatar {
    Avatar {
        id: id.to_string(),
        shopper_id: format!("shopper_{id}"),
        created_at: at(day, 10),
        generation_time_ms,
        success,
        error_message: (!success).then(|| "Pose detection failed".to_string()),
    }
}

pub fn tryon(
    id: &str,
    avatar_id: &str,
    product_id: &str,
    day: u32,
    generation_time_ms: u64,
    success: bool,
) -> TryOn {
    TryOn {
        id: id.to_string(),
        avatar_id: avatar_id.to_string(),
        product_id: product_id.to_string(),
        created_at: at(day, 11),
        generation_time_ms,
        success,
        angles_generated: if success { 4 } else { 0 },
        error_message: (!success).then(|| "Garment overlay failed".to_string()),
    }
}

pub fn product(id: &str, category: ProductCategory, enabled: bool) -> Product {
    Product {
        id: id.to_string(),
        sku: format!("SKU-{id}"),
        name: format!("Product {id}"),
        category,
        brand: "Figr".to_string(),
        enabled,
        available_sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
        image_url: None,
    }
}

pub fn size_rec(id: &str, size: &str, day: u32) -> SizeRecommendation {
    SizeRecommendation {
        id: id.to_string(),
        shopper_id: format!("shopper_{id}"),
        product_id: "prod_1".to_string(),
        recommended_size: size.to_string(),
        created_at: at(day, 12),
    }
}

pub fn event(shopper_id: &str, event_type: EventType, day: u32) -> Event {
    Event {
        id: format!("evt_{shopper_id}_{event_type:?}"),
        shopper_id: shopper_id.to_string(),
        event_type,
        created_at: at(day, 13),
        metadata: None,
    }
}

/// Ten shoppers walking a shrinking funnel, spread over 1-10 December 2025.
pub fn funnel_events() -> Vec<Event> {
    let reached = [
        (EventType::OnboardingStarted, 10),
        (EventType::PhotoUploaded, 8),
        (EventType::AvatarCreated, 6),
        (EventType::TryonCompleted, 4),
        (EventType::Purchase, 1),
    ];
    let mut events = Vec::new();
    for (event_type, shoppers) in reached {
        for n in 1..=shoppers {
            events.push(event(&format!("shopper_{n}"), event_type, n));
        }
    }
    events
}

/// A small, healthy-looking catalog and activity set.
pub fn sample_dataset() -> Dataset {
    Dataset {
        shoppers: vec![
            shopper("s1", 1, true),
            shopper("s2", 2, true),
            shopper("s3", 3, false),
            shopper("s4", 9, true),
        ],
        avatars: vec![
            avatar("a1", 1, 8000, true),
            avatar("a2", 2, 9000, true),
            avatar("a3", 3, 7000, false),
            avatar("a4", 9, 10000, true),
        ],
        tryons: vec![
            tryon("t1", "a1", "p1", 1, 2000, true),
            tryon("t2", "a1", "p2", 2, 2400, true),
            tryon("t3", "a2", "p1", 2, 2600, true),
            tryon("t4", "a2", "p3", 3, 2200, false),
            tryon("t5", "a4", "p1", 9, 3000, true),
        ],
        products: vec![
            product("p1", ProductCategory::Tops, true),
            product("p2", ProductCategory::Bottoms, true),
            product("p3", ProductCategory::OnePieces, true),
            product("p4", ProductCategory::Tops, false),
        ],
        events: funnel_events(),
        size_recommendations: vec![
            size_rec("r1", "M", 1),
            size_rec("r2", "XS", 2),
            size_rec("r3", "L", 3),
            size_rec("r4", "M", 9),
        ],
    }
}
