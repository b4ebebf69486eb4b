use std::path::PathBuf;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::dataset::{self, Dataset};
use crate::db;

/// Where the read-only dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Directory(PathBuf),
    Postgres(String),
}

impl DataSource {
    /// A database URL wins over the JSON directory when both are configured.
    pub fn resolve(data_dir: PathBuf, database_url: Option<String>) -> Self {
        match database_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => DataSource::Postgres(url),
            None => DataSource::Directory(data_dir),
        }
    }

    pub async fn load(&self) -> anyhow::Result<Dataset> {
        match self {
            DataSource::Directory(dir) => dataset::load_dir(dir),
            DataSource::Postgres(url) => {
                let pool = connect(url).await?;
                db::fetch_dataset(&pool).await
            }
        }
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_takes_precedence() {
        let source = DataSource::resolve(
            PathBuf::from("data"),
            Some("postgres://localhost/brand".to_string()),
        );
        assert_eq!(source, DataSource::Postgres("postgres://localhost/brand".to_string()));
    }

    #[test]
    fn blank_database_url_falls_back_to_directory() {
        let source = DataSource::resolve(PathBuf::from("data"), Some("  ".to_string()));
        assert_eq!(source, DataSource::Directory(PathBuf::from("data")));
    }
}
