use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

mod comparison;
mod config;
mod dataset;
mod dates;
mod db;
mod export;
mod metrics;
mod models;
mod recommendations;
mod report;
mod validate;

#[cfg(test)]
mod fixtures;

use config::DataSource;
use metrics::Analytics;
use models::DateRange;

#[derive(Parser)]
#[command(name = "brand-metrics")]
#[command(
    about = "Avatar, try-on and catalog metrics for the Figr brand dashboard",
    long_about = None
)]
struct Cli {
    /// Directory holding the JSON dataset
    #[arg(long, global = true, env = "BRAND_METRICS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
    /// Read the dataset from Postgres instead of the JSON directory
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
struct RangeArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
    /// Window covering the last N days up to today
    #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
    last_days: Option<u32>,
}

impl RangeArgs {
    fn resolve(&self, today: NaiveDate) -> anyhow::Result<DateRange> {
        let range = match self.last_days {
            Some(days) => DateRange::last_days(days, today),
            None => validate::validate_range(
                self.start_date.as_deref(),
                self.end_date.as_deref(),
                today,
            ),
        };
        range.map_err(|err| anyhow::anyhow!("{}: {err}", err.title()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the Postgres dataset schema
    InitDb,
    #[command(flatten)]
    Metrics(MetricCommand),
}

#[derive(Subcommand)]
enum MetricCommand {
    /// Headline KPIs
    Summary {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Avatar generation metrics
    Avatars {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Virtual try-on metrics
    Tryons {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Catalog coverage and most tried-on products
    Products {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Shopper demographics and size recommendations
    Shoppers {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Latency and error rates
    Performance {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Onboarding to purchase drop-off
    Funnel {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Compare against the preceding period of equal length
    Compare {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Actionable recommendations, most severe first
    Recommend {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        json: bool,
    },
    /// Export summary, shopper and product metrics as CSV
    Export {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = DataSource::resolve(cli.data_dir, cli.database_url);

    match cli.command {
        Commands::InitDb => {
            let DataSource::Postgres(url) = &source else {
                anyhow::bail!("init-db needs DATABASE_URL or --database-url");
            };
            let pool = config::connect(url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Metrics(command) => {
            let dataset = source.load().await.context("failed to load dataset")?;
            run(command, &Analytics::new(&dataset), Utc::now().date_naive())?;
        }
    }

    Ok(())
}

fn run(command: MetricCommand, analytics: &Analytics<'_>, today: NaiveDate) -> anyhow::Result<()> {
    match command {
        MetricCommand::Summary { range } => print_json(&analytics.summary(&range.resolve(today)?))?,
        MetricCommand::Avatars { range } => print_json(&analytics.avatars(&range.resolve(today)?))?,
        MetricCommand::Tryons { range } => print_json(&analytics.tryons(&range.resolve(today)?))?,
        MetricCommand::Products { range } => {
            print_json(&analytics.products(&range.resolve(today)?))?
        }
        MetricCommand::Shoppers { range } => {
            print_json(&analytics.shoppers(&range.resolve(today)?))?
        }
        MetricCommand::Performance { range } => {
            print_json(&analytics.performance(&range.resolve(today)?))?
        }
        MetricCommand::Funnel { range } => {
            print_json(&analytics.dropoff_funnel(&range.resolve(today)?))?
        }
        MetricCommand::Compare { range } => {
            let range = range.resolve(today)?;
            print_json(&comparison::compare_periods(analytics, &range))?
        }
        MetricCommand::Recommend { range, json } => {
            let range = range.resolve(today)?;
            tracing::info!(period = %dates::format_period(&range), "evaluating recommendations");
            let recs = recommendations::recommendations(analytics, &range);

            if json {
                print_json(&recs)?;
            } else if recs.is_empty() {
                println!("No recommendations for this period.");
            } else {
                println!("Recommendations ({}):", dates::format_period(&range));
                for rec in &recs {
                    println!(
                        "- [{}/{}] {}: {} ({})",
                        rec.severity.as_str(),
                        rec.category.as_str(),
                        rec.title,
                        rec.value,
                        rec.action
                    );
                }
            }
        }
        MetricCommand::Export { range, out } => {
            let range = range.resolve(today)?;
            let summary = analytics.summary(&range);
            let shoppers = analytics.shoppers(&range);
            let products = analytics.products(&range);
            let rows = export::report_rows(Some(&summary), Some(&shoppers), Some(&products));

            let out = out.unwrap_or_else(|| PathBuf::from(export::report_file_name(today)));
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            export::write_csv(&rows, file)?;
            println!("Exported {} rows to {}.", rows.len(), out.display());
        }
        MetricCommand::Report { range, out } => {
            let report = report::build_report(analytics, &range.resolve(today)?);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
