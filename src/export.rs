use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ProductMetrics, ShopperMetrics, SummaryMetrics};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub section: String,
    pub metric: String,
    pub value: String,
}

impl ExportRow {
    fn new(section: &str, metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            section: section.to_string(),
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}

pub fn report_file_name(today: NaiveDate) -> String {
    format!("figr_brand_report_{}.csv", today.format("%Y-%m-%d"))
}

/// Flattens the dashboard reports into `section,metric,value` rows.
pub fn report_rows(
    summary: Option<&SummaryMetrics>,
    shoppers: Option<&ShopperMetrics>,
    products: Option<&ProductMetrics>,
) -> Vec<ExportRow> {
    let mut rows = Vec::new();

    if let Some(summary) = summary {
        const SECTION: &str = "Summary Metrics";
        rows.extend([
            ExportRow::new(SECTION, "Total Avatars", summary.total_avatars),
            ExportRow::new(SECTION, "Total Try-ons", summary.total_tryons),
            ExportRow::new(
                SECTION,
                "Completion Rate",
                format!("{}%", summary.avatar_completion_rate),
            ),
            ExportRow::new(
                SECTION,
                "Try-on Conversion",
                format!("{}%", summary.tryon_conversion_rate),
            ),
            ExportRow::new(SECTION, "SKU Coverage", format!("{}%", summary.sku_coverage)),
            ExportRow::new(SECTION, "Avg Latency", format!("{}ms", summary.avg_latency_ms)),
            ExportRow::new(SECTION, "Error Rate", format!("{}%", summary.error_rate)),
        ]);
    }

    if let Some(shoppers) = shoppers {
        rows.extend(
            shoppers
                .height_distribution
                .iter()
                .map(|bin| ExportRow::new("Height Distribution", bin.range.clone(), bin.count)),
        );
        rows.extend(shoppers.size_recommendations.iter().map(|size| {
            ExportRow::new(
                "Size Recommendations",
                format!("Size {}", size.size),
                size.count,
            )
        }));
    }

    if let Some(products) = products {
        rows.extend(products.top_products.iter().enumerate().map(|(i, product)| {
            ExportRow::new("Top Products", format!("#{} {}", i + 1, product.name), product.tryons)
        }));
    }

    rows
}

/// Writes rows as CSV with a header line. Nothing is written for an empty set.
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
