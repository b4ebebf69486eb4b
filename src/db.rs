use anyhow::Context;
use serde::de::{value::Error as LabelError, DeserializeOwned, IntoDeserializer};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::dataset::Dataset;
use crate::models::{Avatar, Event, Product, Shopper, SizeRecommendation, TryOn};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Maps a stored text label onto one of the closed vocabularies in `models`.
fn label<T: DeserializeOwned>(raw: String, column: &str) -> anyhow::Result<T> {
    T::deserialize(IntoDeserializer::<LabelError>::into_deserializer(raw.clone()))
        .with_context(|| format!("unknown {column} value {raw:?}"))
}

fn unsigned<T: TryFrom<i64>>(value: i64, column: &str) -> anyhow::Result<T> {
    T::try_from(value).map_err(|_| anyhow::anyhow!("negative {column}: {value}"))
}

fn shopper(row: PgRow) -> anyhow::Result<Shopper> {
    Ok(Shopper {
        id: row.try_get("id")?,
        gender: label(row.try_get("gender")?, "gender")?,
        height_cm: unsigned(i64::from(row.try_get::<i32, _>("height_cm")?), "height_cm")?,
        age: unsigned(i64::from(row.try_get::<i32, _>("age")?), "age")?,
        country: row.try_get("country")?,
        created_at: row.try_get("created_at")?,
        completed_onboarding: row.try_get("completed_onboarding")?,
        drop_off_stage: label(row.try_get("drop_off_stage")?, "drop_off_stage")?,
    })
}

fn avatar(row: PgRow) -> anyhow::Result<Avatar> {
    Ok(Avatar {
        id: row.try_get("id")?,
        shopper_id: row.try_get("shopper_id")?,
        created_at: row.try_get("created_at")?,
        generation_time_ms: unsigned(row.try_get("generation_time_ms")?, "generation_time_ms")?,
        success: row.try_get("success")?,
        error_message: row.try_get("error_message")?,
    })
}

fn product(row: PgRow) -> anyhow::Result<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        category: label(row.try_get("category")?, "category")?,
        brand: row.try_get("brand")?,
        enabled: row.try_get("enabled")?,
        available_sizes: row.try_get("available_sizes")?,
        image_url: row.try_get("image_url")?,
    })
}

fn tryon(row: PgRow) -> anyhow::Result<TryOn> {
    Ok(TryOn {
        id: row.try_get("id")?,
        avatar_id: row.try_get("avatar_id")?,
        product_id: row.try_get("product_id")?,
        created_at: row.try_get("created_at")?,
        generation_time_ms: unsigned(row.try_get("generation_time_ms")?, "generation_time_ms")?,
        success: row.try_get("success")?,
        angles_generated: unsigned(
            i64::from(row.try_get::<i32, _>("angles_generated")?),
            "angles_generated",
        )?,
        error_message: row.try_get("error_message")?,
    })
}

fn size_recommendation(row: PgRow) -> anyhow::Result<SizeRecommendation> {
    Ok(SizeRecommendation {
        id: row.try_get("id")?,
        shopper_id: row.try_get("shopper_id")?,
        product_id: row.try_get("product_id")?,
        recommended_size: row.try_get("recommended_size")?,
        created_at: row.try_get("created_at")?,
    })
}

fn event(row: PgRow) -> anyhow::Result<Event> {
    let metadata: Option<serde_json::Value> = row.try_get("metadata")?;
    Ok(Event {
        id: row.try_get("id")?,
        shopper_id: row.try_get("shopper_id")?,
        event_type: label(row.try_get("event_type")?, "event_type")?,
        created_at: row.try_get("created_at")?,
        metadata: metadata
            .map(serde_json::from_value)
            .transpose()
            .context("event metadata must be a JSON object")?,
    })
}

async fn fetch<T>(
    pool: &PgPool,
    table: &str,
    columns: &str,
    convert: fn(PgRow) -> anyhow::Result<T>,
) -> anyhow::Result<Vec<T>> {
    let query = format!("SELECT {columns} FROM brand_metrics.{table} ORDER BY seq");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .with_context(|| format!("failed to load brand_metrics.{table}"))?;

    rows.into_iter()
        .map(convert)
        .collect::<anyhow::Result<Vec<_>>>()
        .with_context(|| format!("malformed row in brand_metrics.{table}"))
}

/// Loads the whole dataset once, in the order records were stored.
pub async fn fetch_dataset(pool: &PgPool) -> anyhow::Result<Dataset> {
    let dataset = Dataset {
        shoppers: fetch(
            pool,
            "shoppers",
            "id, gender, height_cm, age, country, created_at, completed_onboarding, drop_off_stage",
            shopper,
        )
        .await?,
        avatars: fetch(
            pool,
            "avatars",
            "id, shopper_id, created_at, generation_time_ms, success, error_message",
            avatar,
        )
        .await?,
        tryons: fetch(
            pool,
            "tryons",
            concat!(
                "id, avatar_id, product_id, created_at, generation_time_ms, success, ",
                "angles_generated, error_message"
            ),
            tryon,
        )
        .await?,
        products: fetch(
            pool,
            "products",
            "id, sku, name, category, brand, enabled, available_sizes, image_url",
            product,
        )
        .await?,
        events: fetch(
            pool,
            "events",
            "id, shopper_id, event_type, created_at, metadata",
            event,
        )
        .await?,
        size_recommendations: fetch(
            pool,
            "size_recommendations",
            "id, shopper_id, product_id, recommended_size, created_at",
            size_recommendation,
        )
        .await?,
    };

    dataset.log_loaded("postgres");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventType, ProductCategory};

    #[test]
    fn labels_map_onto_enums() {
        let category: ProductCategory = label("one-pieces".to_string(), "category").unwrap();
        assert_eq!(category, ProductCategory::OnePieces);
        let event_type: EventType = label("tryon_completed".to_string(), "event_type").unwrap();
        assert_eq!(event_type, EventType::TryonCompleted);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = label::<ProductCategory>("shoes".to_string(), "category").unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }

    #[test]
    fn negative_durations_are_rejected() {
        assert!(unsigned::<u64>(-5, "generation_time_ms").is_err());
        assert_eq!(unsigned::<u64>(2400, "generation_time_ms").unwrap(), 2400);
    }
}
