// file: src/pipeline/demo.rs
// description: read-back demo over the tabular, vector and S3-backed tables
// reference: prints each result set as a console table

use crate::config::Settings;
use crate::database::{ClickHouseConnector, S3_EVENTS_TABLE, TabularTableManager, VectorTableManager};
use crate::dataset::load_vector_items;
use crate::error::{Result, WarehouseError};
use crate::models::{SimilarityMatch, TabularEvent};
use crate::storage::{ObjectStoreBackend, ObjectStoreManager, S3DatasetMapper};
use crate::utils::display::{events_table, matches_table};
use crate::utils::logging::{format_info, format_rule, format_success, format_warning};
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEMO_EVENT_LIMIT: u64 = 10;
pub const DEMO_MATCH_LIMIT: u64 = 3;
pub const DEMO_S3_LIMIT: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum VectorDemo {
    Matches(Vec<SimilarityMatch>),
    DatasetMissing(PathBuf),
    NoRecords,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub events: Vec<TabularEvent>,
    pub vectors: VectorDemo,
    pub s3_function_rows: Vec<TabularEvent>,
    pub s3_table_rows: Vec<TabularEvent>,
}

fn print_rows(title: &str, table: comfy_table::Table, empty: bool) {
    if empty {
        println!("{}", format_warning(&format!("No rows returned for {}", title)));
    } else {
        println!("{}", table);
    }
}

/// The similarity query uses the first local vector record as its query; a missing
/// vector dataset is reported and the demo carries on.
pub async fn run_demo<B: ObjectStoreBackend>(
    settings: &Settings,
    connector: &ClickHouseConnector,
    store: &ObjectStoreManager<B>,
) -> Result<DemoReport> {
    println!("{}", format_rule("ClickHouse CRUD Demo"));

    println!("{}", format_info("Tabular dataset"));
    let events = TabularTableManager::new(connector)
        .fetch_events(DEMO_EVENT_LIMIT)
        .await?;
    print_rows("events", events_table(&events), events.is_empty());

    println!("{}", format_info("Vector similarity"));
    let vectors = match load_vector_items(&settings.paths) {
        Ok(records) => match records.first() {
            Some(anchor) => {
                info!("Searching neighbours of item {}", anchor.item_id);
                let matches = VectorTableManager::new(connector)
                    .similarity_search(&anchor.vector, DEMO_MATCH_LIMIT)
                    .await?;
                print_rows("vector matches", matches_table(&matches), matches.is_empty());
                VectorDemo::Matches(matches)
            }
            None => {
                println!("{}", format_warning("No vector data available"));
                VectorDemo::NoRecords
            }
        },
        Err(WarehouseError::VectorDatasetMissing { path }) => {
            warn!("Vector dataset missing at {}", path.display());
            println!(
                "{}",
                format_warning(
                    "Vector dataset not found. Run `warehouse generate-vectors` first."
                )
            );
            VectorDemo::DatasetMissing(path)
        }
        Err(e) => return Err(e),
    };

    println!("{}", format_info("S3-backed dataset"));
    let mapper = S3DatasetMapper::new(connector, store, &settings.s3, &settings.paths);
    mapper.create_s3_mapped_table(S3_EVENTS_TABLE).await?;

    let s3_function_rows = mapper.query_s3_dataset(DEMO_S3_LIMIT).await?;
    print_rows(
        "s3 events (function)",
        events_table(&s3_function_rows),
        s3_function_rows.is_empty(),
    );

    let s3_table_rows = mapper.fetch_s3_events(DEMO_S3_LIMIT).await?;
    print_rows(
        "s3 events (mapped table)",
        events_table(&s3_table_rows),
        s3_table_rows.is_empty(),
    );

    println!("{}", format_success("CRUD demo complete"));

    Ok(DemoReport {
        events,
        vectors,
        s3_function_rows,
        s3_table_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::settings;
    use crate::database::client::test_support::connector;
    use crate::models::Amount;
    use crate::storage::object_store::test_support::MemoryBackend;
    use chrono::{TimeZone, Utc};
    use clickhouse::test::{Mock, handlers};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn events() -> Vec<TabularEvent> {
        vec![
            TabularEvent {
                event_id: 2,
                event_time: Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
                customer_id: 20,
                event_type: "purchase".to_string(),
                amount: Amount::from_cents(4950),
            },
            TabularEvent {
                event_id: 1,
                event_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
                customer_id: 10,
                event_type: "click".to_string(),
                amount: Amount::from_cents(999),
            },
        ]
    }

    #[tokio::test]
    async fn test_demo_with_vector_dataset() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("vector_items.jsonl"),
            "{\"item_id\": 1, \"category\": \"electronics\", \"vector\": [1.0, 0.0]}\n",
        )
        .unwrap();
        let settings = settings(temp.path());

        let mock = Mock::new();
        let connector = connector(&mock);
        let store = ObjectStoreManager::new(MemoryBackend::with_bucket("warehouse"), "warehouse");
        let self_match = vec![SimilarityMatch {
            item_id: 1,
            category: "electronics".to_string(),
            score: 0.0,
        }];

        mock.add(handlers::provide(events()));
        mock.add(handlers::provide(self_match.clone()));
        mock.add(handlers::record_ddl());
        mock.add(handlers::provide(events()));
        mock.add(handlers::provide(events()));

        let report = run_demo(&settings, &connector, &store).await.unwrap();

        assert_eq!(report.events, events());
        assert_eq!(report.vectors, VectorDemo::Matches(self_match));
        assert_eq!(report.s3_function_rows.len(), 2);
        assert_eq!(report.s3_table_rows.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_degrades_without_vector_dataset() {
        let temp = TempDir::new().unwrap();
        let settings = settings(temp.path());

        let mock = Mock::new();
        let connector = connector(&mock);
        let store = ObjectStoreManager::new(MemoryBackend::with_bucket("warehouse"), "warehouse");

        mock.add(handlers::provide(events()));
        mock.add(handlers::record_ddl());
        mock.add(handlers::provide(Vec::<TabularEvent>::new()));
        mock.add(handlers::provide(Vec::<TabularEvent>::new()));

        let report = run_demo(&settings, &connector, &store).await.unwrap();

        assert!(matches!(report.vectors, VectorDemo::DatasetMissing(ref path) if path.ends_with("vector_items.jsonl")));
        assert!(report.s3_function_rows.is_empty());
    }
}
