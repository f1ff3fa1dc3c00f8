// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WarehouseError>;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingVariable(String),

    #[error("Tabular dataset not found at {}", path.display())]
    TabularDatasetMissing { path: PathBuf },

    #[error("Vector dataset not found at {}", path.display())]
    VectorDatasetMissing { path: PathBuf },

    #[error("Embedding model '{model}' not found at {}", path.display())]
    ModelNotFound { model: String, path: PathBuf },

    #[error("Local file not found: {}", path.display())]
    SourceFileMissing { path: PathBuf },

    #[error("Target file {} already exists", path.display())]
    OutputExists { path: PathBuf },

    #[error("Dataset parse error in {} (line {line}): {message}", path.display())]
    DatasetParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient permissions to access S3 bucket '{bucket}'")]
    PermissionDenied { bucket: String },

    #[error("Database error: {0}")]
    Database(#[from] clickhouse::error::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] aws_sdk_s3::Error),

    #[error("Object store I/O error for {}: {message}", path.display())]
    ObjectStoreIo { path: PathBuf, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Model hub error: {0}")]
    ModelHub(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl WarehouseError {
    /// Missing local resources are reported with a remediation hint instead of a trace.
    pub fn is_missing_resource(&self) -> bool {
        matches!(
            self,
            WarehouseError::TabularDatasetMissing { .. }
                | WarehouseError::VectorDatasetMissing { .. }
                | WarehouseError::ModelNotFound { .. }
                | WarehouseError::SourceFileMissing { .. }
                | WarehouseError::OutputExists { .. }
        )
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            WarehouseError::TabularDatasetMissing { .. } => {
                Some("Restore assets/data/tabular_events.csv (or point DATA_DIR at a directory containing it).")
            }
            WarehouseError::VectorDatasetMissing { .. } => {
                Some("Run `warehouse generate-vectors` to populate assets/data/vector_items.jsonl.")
            }
            WarehouseError::ModelNotFound { .. } => {
                Some("Run `warehouse download-models` to populate assets/models.")
            }
            WarehouseError::SourceFileMissing { .. } => {
                Some("Check that the file exists before uploading it.")
            }
            WarehouseError::OutputExists { .. } => Some("Use --overwrite to regenerate."),
            _ => None,
        }
    }
}
