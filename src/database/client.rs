// file: src/database/client.rs
// description: ClickHouse connector handing out one client session per operation
// reference: https://docs.rs/clickhouse

use crate::config::ClickHouseSettings;
use crate::error::Result;
use clickhouse::{Client, Compression, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Row, Serialize, Deserialize)]
pub(crate) struct Count {
    pub(crate) total: u64,
}

/// Builds a fresh client for every scoped operation; nothing is pooled across calls
/// and the session is released when it goes out of scope.
#[derive(Debug, Clone)]
pub struct ClickHouseConnector {
    settings: ClickHouseSettings,
    url: String,
    compression: bool,
}

impl ClickHouseConnector {
    pub fn new(settings: &ClickHouseSettings) -> Self {
        Self {
            url: settings.http_url(),
            settings: settings.clone(),
            compression: true,
        }
    }

    /// Point at an explicit HTTP endpoint instead of `host:http_port`.
    pub fn with_url(settings: &ClickHouseSettings, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            settings: settings.clone(),
            compression: true,
        }
    }

    pub fn without_compression(mut self) -> Self {
        self.compression = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.settings.database
    }

    pub fn session(&self) -> Client {
        debug!("Opening ClickHouse session at {}", self.url);

        let compression = if self.compression {
            Compression::Lz4
        } else {
            Compression::None
        };

        Client::default()
            .with_url(&self.url)
            .with_user(&self.settings.user)
            .with_password(&self.settings.password)
            .with_database(&self.settings.database)
            .with_compression(compression)
            .with_option("allow_experimental_vector_similarity_index", "1")
    }

    /// Run a statement that returns no rows.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql.trim());
        self.session().query(sql).execute().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<bool> {
        let count = self
            .session()
            .query("SELECT count() AS total FROM system.one")
            .fetch_one::<Count>()
            .await?;
        info!("ClickHouse connection successful");
        Ok(count.total == 1)
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count = self
            .session()
            .query(
                "SELECT count() AS total FROM system.tables WHERE database = currentDatabase() AND name = ?",
            )
            .bind(table_name)
            .fetch_one::<Count>()
            .await?;
        Ok(count.total > 0)
    }

    pub async fn count_rows(&self, table_name: &str) -> Result<u64> {
        crate::utils::validation::Validator::validate_identifier(table_name)?;
        let sql = format!("SELECT count() AS total FROM {}", table_name);
        let count = self.session().query(&sql).fetch_one::<Count>().await?;
        Ok(count.total)
    }
}
