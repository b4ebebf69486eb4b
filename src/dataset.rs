use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::models::{Avatar, Event, Product, Shopper, SizeRecommendation, TryOn};

/// The six read-only collections every aggregation reads from.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub shoppers: Vec<Shopper>,
    pub avatars: Vec<Avatar>,
    pub tryons: Vec<TryOn>,
    pub products: Vec<Product>,
    pub events: Vec<Event>,
    pub size_recommendations: Vec<SizeRecommendation>,
}

impl Dataset {
    pub fn record_count(&self) -> usize {
        self.shoppers.len()
            + self.avatars.len()
            + self.tryons.len()
            + self.products.len()
            + self.events.len()
            + self.size_recommendations.len()
    }

    pub(crate) fn log_loaded(&self, source: &str) {
        let failures_without_reason = self
            .avatars
            .iter()
            .filter(|a| !a.success && a.error_message.is_none())
            .count()
            + self
                .tryons
                .iter()
                .filter(|t| !t.success && t.error_message.is_none())
                .count();

        tracing::info!(
            source,
            records = self.record_count(),
            shoppers = self.shoppers.len(),
            avatars = self.avatars.len(),
            tryons = self.tryons.len(),
            products = self.products.len(),
            events = self.events.len(),
            size_recommendations = self.size_recommendations.len(),
            "dataset loaded"
        );
        if failures_without_reason > 0 {
            tracing::debug!(failures_without_reason, "failed generations carry no error message");
        }
    }
}

fn read_collection<T: DeserializeOwned>(dir: &Path, file: &str) -> anyhow::Result<Vec<T>> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed records in {}", path.display()))
}

/// Loads the JSON dataset exported alongside the dashboard (`shoppers.json`, `avatars.json`, ...).
pub fn load_dir(dir: &Path) -> anyhow::Result<Dataset> {
    let dataset = Dataset {
        shoppers: read_collection(dir, "shoppers.json")?,
        avatars: read_collection(dir, "avatars.json")?,
        tryons: read_collection(dir, "tryons.json")?,
        products: read_collection(dir, "products.json")?,
        events: read_collection(dir, "events.json")?,
        size_recommendations: read_collection(dir, "sizeRecommendations.json")?,
    };
    dataset.log_loaded(&dir.display().to_string());
    Ok(dataset)
}
