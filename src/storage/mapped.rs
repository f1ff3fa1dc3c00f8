// file: src/storage/mapped.rs
// description: stage the tabular sample to object storage and read it back through ClickHouse
// reference: https://clickhouse.com/docs/en/engines/table-engines/integrations/s3

use crate::config::{PathSettings, S3Settings};
use crate::database::client::ClickHouseConnector;
use crate::database::schema::{
    S3_EVENTS_TABLE, latest_events_sql, s3_table_ddl, s3_table_function,
};
use crate::dataset::load_tabular_events;
use crate::error::Result;
use crate::models::TabularEvent;
use crate::storage::object_store::{ObjectStoreBackend, ObjectStoreManager};
use crate::utils::validation::Validator;
use std::io::Write;
use tracing::info;

pub const STAGED_DATASET_KEY: &str = "datasets/events_sample.csv";
pub const MAPPED_DATASET_PATTERN: &str = "datasets/events_*.csv";
const STAGED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write events as `CSVWithNames` the database engine can parse back.
pub fn write_events_csv<W: Write>(events: &[TabularEvent], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["event_id", "event_time", "customer_id", "event_type", "amount"])?;
    for event in events {
        csv.write_record([
            event.event_id.to_string(),
            event.event_time.format(STAGED_TIME_FORMAT).to_string(),
            event.customer_id.to_string(),
            event.event_type.clone(),
            event.amount.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub struct S3DatasetMapper<'a, B: ObjectStoreBackend> {
    connector: &'a ClickHouseConnector,
    store: &'a ObjectStoreManager<B>,
    s3: &'a S3Settings,
    paths: &'a PathSettings,
}

impl<'a, B: ObjectStoreBackend> S3DatasetMapper<'a, B> {
    pub fn new(
        connector: &'a ClickHouseConnector,
        store: &'a ObjectStoreManager<B>,
        s3: &'a S3Settings,
        paths: &'a PathSettings,
    ) -> Self {
        Self {
            connector,
            store,
            s3,
            paths,
        }
    }

    /// Upload the local tabular sample under `STAGED_DATASET_KEY` and return the key.
    pub async fn stage_sample_dataset(&self) -> Result<String> {
        self.store.ensure_bucket_exists().await?;
        let events = load_tabular_events(self.paths)?;

        let mut staged = tempfile::Builder::new()
            .prefix("events_")
            .suffix(".csv")
            .tempfile()?;
        write_events_csv(&events, staged.as_file_mut())?;

        self.store
            .upload_file(staged.path(), STAGED_DATASET_KEY)
            .await?;
        staged.close()?;

        info!(
            "Staged {} events at s3://{}/{}",
            events.len(),
            self.store.bucket(),
            STAGED_DATASET_KEY
        );
        Ok(STAGED_DATASET_KEY.to_string())
    }

    /// Table whose rows come from every staged `events_*.csv` object.
    pub async fn create_s3_mapped_table(&self, table_name: &str) -> Result<()> {
        Validator::validate_identifier(table_name)?;
        let ddl = s3_table_ddl(
            table_name,
            &self.s3.object_url(MAPPED_DATASET_PATTERN),
            &self.s3.access_key,
            &self.s3.secret_key,
        );
        info!("Mapping {} onto {}", table_name, MAPPED_DATASET_PATTERN);
        self.connector.execute(&ddl).await
    }

    /// Newest-first read of the staged object through the `s3()` table function.
    pub fn s3_dataset_sql(&self) -> String {
        latest_events_sql(&s3_table_function(
            &self.s3.object_url(STAGED_DATASET_KEY),
            &self.s3.access_key,
            &self.s3.secret_key,
        ))
    }

    /// Read the staged object directly through the `s3()` table function.
    pub async fn query_s3_dataset(&self, limit: u64) -> Result<Vec<TabularEvent>> {
        Ok(self
            .connector
            .session()
            .query(&self.s3_dataset_sql())
            .bind(limit)
            .fetch_all::<TabularEvent>()
            .await?)
    }

    pub async fn fetch_s3_events(&self, limit: u64) -> Result<Vec<TabularEvent>> {
        Ok(self
            .connector
            .session()
            .query(&latest_events_sql(S3_EVENTS_TABLE))
            .bind(limit)
            .fetch_all::<TabularEvent>()
            .await?)
    }

    pub fn staged_object_url(&self) -> String {
        self.s3.object_url(STAGED_DATASET_KEY)
    }
}
