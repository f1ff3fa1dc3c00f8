// file: src/pipeline/bootstrap.rs
// description: provision the warehouse tables, load the samples and map the staged dataset
// reference: drives the table managers and object store in dependency order

use crate::config::Settings;
use crate::database::{
    ClickHouseConnector, LoadStrategy, S3_EVENTS_TABLE, TabularTableManager, VectorMigration,
    VectorTableAction, VectorTableManager,
};
use crate::dataset::{load_tabular_events, load_vector_items};
use crate::error::Result;
use crate::storage::{ObjectStoreBackend, ObjectStoreManager, S3DatasetMapper};
use crate::utils::logging::{format_rule, format_step, format_success};
use crate::utils::telemetry::OperationTimer;
use tracing::info;

const BOOTSTRAP_STEPS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    pub vector_migration: VectorMigration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub events_loaded: u64,
    pub vector_table: VectorTableAction,
    pub vectors_loaded: u64,
    pub staged_key: String,
    pub mapped_table: String,
}

/// Both local datasets are read before any table is touched, so a missing
/// file leaves the warehouse as it was.
pub async fn run_bootstrap<B: ObjectStoreBackend>(
    settings: &Settings,
    connector: &ClickHouseConnector,
    store: &ObjectStoreManager<B>,
    options: BootstrapOptions,
) -> Result<BootstrapReport> {
    let timer = OperationTimer::new("bootstrap");
    println!("{}", format_rule("ClickHouse Bootstrap"));

    let events = load_tabular_events(&settings.paths)?;
    let vector_records = load_vector_items(&settings.paths)?;

    println!("{}", format_step(1, BOOTSTRAP_STEPS, "Setting up tabular table"));
    let tabular = TabularTableManager::new(connector);
    tabular.ensure_table().await?;
    let events_loaded = tabular
        .load_events(&events, LoadStrategy::FullReplace)
        .await?;
    println!("Loaded {} tabular records", events_loaded);

    println!("{}", format_step(2, BOOTSTRAP_STEPS, "Setting up vector table"));
    let vectors = VectorTableManager::new(connector);
    let vector_table = vectors
        .ensure_table(&vector_records, options.vector_migration)
        .await?;
    let vectors_loaded = vectors.load_sample_vectors(&vector_records).await?;
    println!("Loaded {} vector records", vectors_loaded);
    timer.checkpoint("tables loaded");

    println!("{}", format_step(3, BOOTSTRAP_STEPS, "Staging S3 dataset"));
    let mapper = S3DatasetMapper::new(connector, store, &settings.s3, &settings.paths);
    let staged_key = mapper.stage_sample_dataset().await?;
    println!(
        "Uploaded sample dataset to s3://{}/{}",
        store.bucket(),
        staged_key
    );

    println!("{}", format_step(4, BOOTSTRAP_STEPS, "Creating mapped S3 table"));
    mapper.create_s3_mapped_table(S3_EVENTS_TABLE).await?;
    println!("S3 table available as `{}`", S3_EVENTS_TABLE);

    timer.finish();
    info!("Bootstrap complete");
    println!("{}", format_success("Bootstrap complete"));

    Ok(BootstrapReport {
        events_loaded,
        vector_table,
        vectors_loaded,
        staged_key,
        mapped_table: S3_EVENTS_TABLE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::settings;
    use crate::database::client::test_support::connector;
    use crate::database::schema::TableDefinition;
    use crate::error::WarehouseError;
    use crate::models::{TabularEvent, VectorRow};
    use crate::storage::STAGED_DATASET_KEY;
    use crate::storage::object_store::test_support::MemoryBackend;
    use clickhouse::test::{Mock, handlers};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_tabular(dir: &Path) {
        fs::write(
            dir.join("tabular_events.csv"),
            "event_id,event_time,customer_id,event_type,amount\n\
             1,2024-01-01 10:00:00,10,click,9.99\n\
             2,2024-01-01 11:00:00,20,purchase,49.50\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_end_to_end() {
        let temp = TempDir::new().unwrap();
        write_tabular(temp.path());
        fs::write(
            temp.path().join("vector_items.jsonl"),
            "{\"item_id\": 1, \"category\": \"electronics\", \"vector\": [0.1, 0.2, 0.3]}\n\
             {\"item_id\": 2, \"category\": \"apparel\", \"vector\": [0.3, 0.2, 0.1]}\n",
        )
        .unwrap();
        let settings = settings(temp.path());

        let mock = Mock::new();
        let connector = connector(&mock);
        let store = ObjectStoreManager::new(MemoryBackend::default(), "warehouse");

        let events_ddl = mock.add(handlers::record_ddl());
        mock.add(handlers::record_ddl());
        let events_insert = mock.add(handlers::record::<TabularEvent>());
        mock.add(handlers::provide(Vec::<TableDefinition>::new()));
        let vector_ddl = mock.add(handlers::record_ddl());
        mock.add(handlers::record_ddl());
        let vector_insert = mock.add(handlers::record::<VectorRow>());
        let mapped_ddl = mock.add(handlers::record_ddl());

        let report = run_bootstrap(&settings, &connector, &store, BootstrapOptions::default())
            .await
            .unwrap();

        assert_eq!(
            report,
            BootstrapReport {
                events_loaded: 2,
                vector_table: VectorTableAction::Created,
                vectors_loaded: 2,
                staged_key: STAGED_DATASET_KEY.to_string(),
                mapped_table: "s3_events".to_string(),
            }
        );
        assert!(events_ddl.query().await.contains("CREATE TABLE IF NOT EXISTS events"));
        assert_eq!(events_insert.collect::<Vec<_>>().await.len(), 2);
        assert!(vector_ddl.query().await.contains("CHECK length(embedding) = 3"));
        assert_eq!(vector_insert.collect::<Vec<_>>().await.len(), 2);
        assert!(mapped_ddl.query().await.contains("ENGINE = S3("));
        assert!(store.backend().object("warehouse", STAGED_DATASET_KEY).is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_without_vector_dataset_touches_nothing() {
        let temp = TempDir::new().unwrap();
        write_tabular(temp.path());
        let settings = settings(temp.path());

        let mock = Mock::new();
        let connector = connector(&mock);
        let store = ObjectStoreManager::new(MemoryBackend::default(), "warehouse");

        let err = run_bootstrap(&settings, &connector, &store, BootstrapOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WarehouseError::VectorDatasetMissing { .. }));
        assert!(err.remediation().unwrap().contains("generate-vectors"));
        assert_eq!(*store.backend().create_calls.lock().unwrap(), 0);
    }
}
