// file: src/pipeline/check.rs
// description: health report over the database, bucket, model cache and local datasets
// reference: read-only; never creates tables, buckets or files

use crate::config::Settings;
use crate::database::{ClickHouseConnector, EVENTS_TABLE, S3_EVENTS_TABLE, VECTOR_TABLE};
use crate::dataset::{tabular_dataset_path, vector_dataset_path};
use crate::embedding::model_directory;
use crate::error::Result;
use crate::storage::{ObjectStoreBackend, ObjectStoreManager};
use crate::utils::display::key_value_table;
use crate::utils::logging::format_rule;
use crate::utils::telemetry::{HealthCheck, HealthReport, OperationTimer};
use std::time::Instant;
use tracing::warn;

pub const STAGED_PREFIX: &str = "datasets/";

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub health: HealthReport,
    pub row_counts: Vec<(String, u64)>,
    pub staged_objects: Vec<String>,
}

/// Presence of the active model cache and both local datasets.
pub fn local_checks(settings: &Settings) -> Vec<HealthCheck> {
    let model_dir = model_directory(&settings.models.active, &settings.paths.model_cache_dir);

    vec![
        HealthCheck::presence(
            &format!("model cache ({})", settings.models.active),
            model_dir.exists(),
            "Run `warehouse download-models` to populate the model cache.",
        ),
        HealthCheck::presence(
            "tabular dataset",
            tabular_dataset_path(&settings.paths).exists(),
            "Restore assets/data/tabular_events.csv.",
        ),
        HealthCheck::presence(
            "vector dataset",
            vector_dataset_path(&settings.paths).exists(),
            "Run `warehouse generate-vectors` to create the vector dataset.",
        ),
    ]
}

async fn row_counts(connector: &ClickHouseConnector) -> Vec<(String, u64)> {
    let mut counts = Vec::new();
    for table in [EVENTS_TABLE, VECTOR_TABLE, S3_EVENTS_TABLE] {
        match connector.table_exists(table).await {
            Ok(true) => match connector.count_rows(table).await {
                Ok(total) => counts.push((table.to_string(), total)),
                Err(e) => warn!("Could not count rows in {}: {}", table, e),
            },
            Ok(false) => warn!("Table {} does not exist", table),
            Err(e) => warn!("Could not inspect {}: {}", table, e),
        }
    }
    counts
}

pub async fn run_check<B: ObjectStoreBackend>(
    settings: &Settings,
    connector: &ClickHouseConnector,
    store: &ObjectStoreManager<B>,
) -> Result<CheckReport> {
    let timer = OperationTimer::new("check");
    println!("{}", format_rule("Warehouse Check"));
    let mut checks = Vec::new();

    let started = Instant::now();
    let ping = connector.ping().await;
    checks.push(HealthCheck::from_result(
        &format!("clickhouse ({})", connector.url()),
        &ping,
        started.elapsed(),
    ));

    let started = Instant::now();
    let bucket = store.bucket_exists().await;
    let bucket_component = format!("bucket ({})", store.bucket());
    checks.push(match &bucket {
        Ok(true) => HealthCheck::healthy(&bucket_component, started.elapsed()),
        Ok(false) => HealthCheck::degraded(
            &bucket_component,
            "Bucket does not exist yet; `warehouse bootstrap` creates it.".to_string(),
            started.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy(&bucket_component, e.to_string(), started.elapsed()),
    });

    let staged_objects = if matches!(bucket, Ok(true)) {
        let started = Instant::now();
        match store.list_objects(STAGED_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                checks.push(HealthCheck::unhealthy(
                    &format!("staged objects ({})", STAGED_PREFIX),
                    e.to_string(),
                    started.elapsed(),
                ));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    checks.extend(local_checks(settings));

    let row_counts = if ping.is_ok() {
        row_counts(connector).await
    } else {
        Vec::new()
    };

    let health = HealthReport::new(checks);
    println!("{}", health.format());

    if !row_counts.is_empty() {
        let rows: Vec<(String, String)> = row_counts
            .iter()
            .map(|(table, total)| (table.clone(), total.to_string()))
            .collect();
        println!("{}", key_value_table(&rows));
    }
    for key in &staged_objects {
        println!("  s3://{}/{}", store.bucket(), key);
    }

    timer.finish();
    Ok(CheckReport {
        health,
        row_counts,
        staged_objects,
    })
}
