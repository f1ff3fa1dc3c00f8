// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod utils;

pub use config::{ClickHouseSettings, ModelSettings, PathSettings, S3Settings, Settings};
pub use database::{
    ClickHouseConnector, LoadStrategy, SchemaManager, TabularTableManager, VectorMigration,
    VectorTableManager,
};
pub use embedding::{EmbeddingGenerator, ModelCache, ModelDownloader, SentenceEncoder};
pub use error::{Result, WarehouseError};
pub use models::{Amount, SimilarityMatch, TabularEvent, VectorRecord};
pub use pipeline::{
    BootstrapOptions, GenerateOptions, generate_vectors, run_bootstrap, run_check, run_demo,
};
pub use storage::{ObjectStoreBackend, ObjectStoreManager, S3Backend, S3DatasetMapper};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
