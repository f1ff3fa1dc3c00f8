// file: src/dataset/loader.rs
// description: readers for the tabular CSV sample and the vector JSONL dataset
// reference: https://docs.rs/csv

use crate::config::PathSettings;
use crate::error::{Result, WarehouseError};
use crate::models::{Amount, TabularEvent, VectorRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TABULAR_DATASET_FILENAME: &str = "tabular_events.csv";
pub const VECTOR_DATASET_FILENAME: &str = "vector_items.jsonl";

pub fn tabular_dataset_path(paths: &PathSettings) -> PathBuf {
    paths.data_dir.join(TABULAR_DATASET_FILENAME)
}

pub fn vector_dataset_path(paths: &PathSettings) -> PathBuf {
    paths.data_dir.join(VECTOR_DATASET_FILENAME)
}

/// Raw CSV shape; timestamps and amounts are coerced after reading.
#[derive(Debug, Deserialize)]
struct EventCsvRecord {
    event_id: u32,
    event_time: String,
    customer_id: u32,
    event_type: String,
    amount: String,
}

pub fn load_tabular_events(paths: &PathSettings) -> Result<Vec<TabularEvent>> {
    read_tabular_events(&tabular_dataset_path(paths))
}

pub fn read_tabular_events(path: &Path) -> Result<Vec<TabularEvent>> {
    if !path.exists() {
        return Err(WarehouseError::TabularDatasetMissing {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let parse_error = |e: csv::Error| WarehouseError::DatasetParse {
        path: path.to_path_buf(),
        line: e.position().map(|p| p.line() as usize).unwrap_or(0),
        message: e.to_string(),
    };
    let headers = reader.headers().map_err(parse_error)?.clone();

    let mut events = Vec::new();
    let mut raw = csv::StringRecord::new();
    while reader.read_record(&mut raw).map_err(parse_error)? {
        // first physical line of the record; quoted fields may span several
        let line = raw.position().map(|p| p.line() as usize).unwrap_or(0);
        let record: EventCsvRecord = raw.deserialize(Some(&headers)).map_err(|e| {
            WarehouseError::DatasetParse {
                path: path.to_path_buf(),
                line,
                message: e.to_string(),
            }
        })?;

        let event_time = parse_event_time(&record.event_time).ok_or_else(|| {
            WarehouseError::DatasetParse {
                path: path.to_path_buf(),
                line,
                message: format!("unrecognised event_time '{}'", record.event_time),
            }
        })?;
        let amount = record
            .amount
            .parse::<Amount>()
            .map_err(|e| WarehouseError::DatasetParse {
                path: path.to_path_buf(),
                line,
                message: e.to_string(),
            })?;

        events.push(TabularEvent {
            event_id: record.event_id,
            event_time,
            customer_id: record.customer_id,
            event_type: record.event_type,
            amount,
        });
    }

    info!("Loaded {} tabular events from {}", events.len(), path.display());
    Ok(events)
}

/// Coerce a CSV timestamp to UTC. Offsets are honoured; naive values are taken as UTC.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn load_vector_items(paths: &PathSettings) -> Result<Vec<VectorRecord>> {
    read_vector_items(&vector_dataset_path(paths))
}

/// Every non-blank line must decode; the first bad line aborts the whole load.
pub fn read_vector_items(path: &Path) -> Result<Vec<VectorRecord>> {
    if !path.exists() {
        return Err(WarehouseError::VectorDatasetMissing {
            path: path.to_path_buf(),
        });
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: VectorRecord =
            serde_json::from_str(trimmed).map_err(|e| WarehouseError::DatasetParse {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    debug!("Read {} vector records from {}", records.len(), path.display());
    Ok(records)
}

/// Width shared by every record; this becomes the embedding column dimension.
pub fn vector_dimension(records: &[VectorRecord]) -> Result<usize> {
    let first = records.first().ok_or_else(|| {
        WarehouseError::Validation(
            "Vector dataset is empty; cannot determine the embedding dimension".to_string(),
        )
    })?;

    let dimension = first.dimension();
    if dimension == 0 {
        return Err(WarehouseError::Validation(format!(
            "Vector for item {} is empty",
            first.item_id
        )));
    }

    if let Some(odd) = records.iter().find(|r| r.dimension() != dimension) {
        return Err(WarehouseError::Validation(format!(
            "Vector for item {} has dimension {}, expected {}",
            odd.item_id,
            odd.dimension(),
            dimension
        )));
    }

    Ok(dimension)
}
