// file: src/database/mod.rs
// description: database operations module exports
// reference: internal module structure

pub mod client;
pub mod load;
pub mod schema;
pub mod tabular;
pub mod vector;

pub use client::ClickHouseConnector;
pub use load::{LoadStrategy, write_batch};
pub use schema::{
    EVENTS_TABLE, S3_EVENTS_TABLE, SchemaManager, SchemaReport, VECTOR_TABLE,
};
pub use tabular::TabularTableManager;
pub use vector::{VectorMigration, VectorTableAction, VectorTableManager, plan_migration};
