// file: src/database/tabular.rs
// description: events table provisioning, full-replace loading and read-back
// reference: https://docs.rs/clickhouse

use crate::config::PathSettings;
use crate::database::client::ClickHouseConnector;
use crate::database::load::{LoadStrategy, write_batch};
use crate::database::schema::{EVENTS_TABLE, events_table_ddl, latest_events_sql};
use crate::dataset::load_tabular_events;
use crate::error::Result;
use crate::models::TabularEvent;
use tracing::info;

pub struct TabularTableManager<'a> {
    connector: &'a ClickHouseConnector,
    table: &'a str,
}

impl<'a> TabularTableManager<'a> {
    pub fn new(connector: &'a ClickHouseConnector) -> Self {
        Self {
            connector,
            table: EVENTS_TABLE,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table
    }

    pub async fn ensure_table(&self) -> Result<()> {
        info!("Ensuring table {}", self.table);
        self.connector.execute(&events_table_ddl(self.table)).await
    }

    pub async fn load_events(&self, events: &[TabularEvent], strategy: LoadStrategy) -> Result<u64> {
        let session = self.connector.session();
        write_batch(&session, self.table, events, strategy).await
    }

    /// Read the CSV sample and replace the table contents with it.
    pub async fn load_sample_data(&self, paths: &PathSettings) -> Result<u64> {
        let events = load_tabular_events(paths)?;
        self.load_events(&events, LoadStrategy::FullReplace).await
    }

    /// Latest `limit` events, newest first.
    pub async fn fetch_events(&self, limit: u64) -> Result<Vec<TabularEvent>> {
        let events = self
            .connector
            .session()
            .query(&latest_events_sql(self.table))
            .bind(limit)
            .fetch_all::<TabularEvent>()
            .await?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::client::test_support::connector;
    use crate::models::Amount;
    use chrono::{TimeZone, Utc};
    use clickhouse::test::{Mock, handlers};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn event(event_id: u32, hour: u32, event_type: &str, cents: i64) -> TabularEvent {
        TabularEvent {
            event_id,
            event_time: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            customer_id: event_id * 10,
            event_type: event_type.to_string(),
            amount: Amount::from_cents(cents),
        }
    }

    #[tokio::test]
    async fn test_ensure_table_issues_create() {
        let mock = Mock::new();
        let connector = connector(&mock);
        let ddl = mock.add(handlers::record_ddl());

        TabularTableManager::new(&connector).ensure_table().await.unwrap();

        let query = ddl.query().await;
        assert!(query.contains("CREATE TABLE IF NOT EXISTS events"));
        assert!(query.contains("ORDER BY (event_time, event_id)"));
    }

    #[tokio::test]
    async fn test_load_sample_data_truncates_then_inserts() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings {
            assets_dir: temp.path().to_path_buf(),
            model_cache_dir: temp.path().join("models"),
            data_dir: temp.path().to_path_buf(),
        };
        fs::write(
            temp.path().join("tabular_events.csv"),
            "event_id,event_time,customer_id,event_type,amount\n\
             1,2024-01-01T10:00:00Z,10,click,9.99\n\
             2,2024-01-01T11:00:00Z,20,purchase,49.50\n",
        )
        .unwrap();

        let mock = Mock::new();
        let connector = connector(&mock);
        let truncate = mock.add(handlers::record_ddl());
        let inserted = mock.add(handlers::record::<TabularEvent>());

        let count = TabularTableManager::new(&connector)
            .load_sample_data(&paths)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert!(truncate.query().await.contains("TRUNCATE TABLE IF EXISTS events"));
        let rows: Vec<TabularEvent> = inserted.collect().await;
        assert_eq!(rows, vec![event(1, 10, "click", 999), event(2, 11, "purchase", 4950)]);
    }

    #[tokio::test]
    async fn test_fetch_events_returns_newest_first() {
        let mock = Mock::new();
        let connector = connector(&mock);
        let stored = vec![event(2, 11, "purchase", 4950), event(1, 10, "click", 999)];
        mock.add(handlers::provide(stored.clone()));

        let events = TabularTableManager::new(&connector).fetch_events(2).await.unwrap();

        assert_eq!(events, stored);
        assert!(events.windows(2).all(|w| w[0].event_time >= w[1].event_time));
    }

    #[tokio::test]
    async fn test_load_missing_csv_fails_before_touching_table() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings {
            assets_dir: temp.path().to_path_buf(),
            model_cache_dir: temp.path().join("models"),
            data_dir: temp.path().join("absent"),
        };

        let mock = Mock::new();
        let connector = connector(&mock);
        let err = TabularTableManager::new(&connector)
            .load_sample_data(&paths)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::error::WarehouseError::TabularDatasetMissing { .. }
        ));
    }
}
