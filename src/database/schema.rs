// file: src/database/schema.rs
// description: ClickHouse DDL for the warehouse tables and schema inspection
// reference: https://clickhouse.com/docs/en/engines/table-engines/mergetree-family/annindexes

use crate::database::client::ClickHouseConnector;
use crate::error::Result;
use crate::utils::validation::Validator;
use clickhouse::Row;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const EVENTS_TABLE: &str = "events";
pub const VECTOR_TABLE: &str = "item_vectors";
pub const S3_EVENTS_TABLE: &str = "s3_events";

/// Column list of the CSV-backed event tables, also used as the `s3()` structure argument.
pub const S3_EVENT_STRUCTURE: &str = "event_id UInt32, event_time DateTime('UTC'), customer_id UInt32, event_type String, amount Decimal(10, 2)";

lazy_static! {
    static ref INDEX_DIMENSION: Regex = Regex::new(
        r"vector_similarity\(\s*'hnsw'\s*,\s*'cosineDistance'\s*,\s*(\d+)"
    ).expect("INDEX_DIMENSION regex is valid");

    static ref CONSTRAINT_DIMENSION: Regex = Regex::new(
        r"length\(\s*embedding\s*\)\s*=\s*(\d+)"
    ).expect("CONSTRAINT_DIMENSION regex is valid");
}

pub fn events_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    event_id UInt32,
    event_time DateTime('UTC'),
    customer_id UInt32,
    event_type LowCardinality(String),
    amount Decimal(10, 2)
) ENGINE = MergeTree
ORDER BY (event_time, event_id)"
    )
}

pub fn vector_table_ddl(table: &str, dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    item_id UInt32,
    category LowCardinality(String),
    embedding Array(Float32) CODEC(NONE),
    CONSTRAINT embedding_length CHECK length(embedding) = {dimension},
    INDEX idx_embedding_hnsw embedding TYPE vector_similarity('hnsw', 'cosineDistance', {dimension}) GRANULARITY 1
) ENGINE = MergeTree
ORDER BY item_id"
    )
}

/// Table whose rows are read from object-store CSV files matching `url_pattern` at query time.
pub fn s3_table_ddl(table: &str, url_pattern: &str, access_key: &str, secret_key: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    event_id UInt32,
    event_time DateTime('UTC'),
    customer_id UInt32,
    event_type String,
    amount Decimal(10, 2)
) ENGINE = S3({}, {}, {}, 'CSVWithNames')",
        quote_literal(url_pattern),
        quote_literal(access_key),
        quote_literal(secret_key),
    )
}

/// `s3(...)` table function reading one staged CSV object with an explicit structure.
pub fn s3_table_function(url: &str, access_key: &str, secret_key: &str) -> String {
    format!(
        "s3({}, {}, {}, 'CSVWithNames', {})",
        quote_literal(url),
        quote_literal(access_key),
        quote_literal(secret_key),
        quote_literal(S3_EVENT_STRUCTURE),
    )
}

/// Newest-first read of `limit` events from a table or table function; `?fields` and the
/// limit are bound by the client.
pub fn latest_events_sql(source: &str) -> String {
    format!("SELECT ?fields FROM {source} ORDER BY event_time DESC, event_id DESC LIMIT ?")
}

/// Cosine-distance ranking, smallest distance first. Binds the query vector, then the limit.
pub fn similarity_search_sql(table: &str) -> String {
    format!(
        "SELECT item_id, category, toFloat64(cosineDistance(embedding, ?)) AS score \
         FROM {table} ORDER BY score ASC LIMIT ?"
    )
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

pub fn truncate_table_sql(table: &str) -> String {
    format!("TRUNCATE TABLE IF EXISTS {table}")
}

/// Single-quoted SQL literal. `?` is doubled because the client treats a bare `?` as a bind slot.
pub fn quote_literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('?', "??");
    format!("'{}'", escaped)
}

/// Embedding width declared by a vector table's CREATE statement, if recognisable.
pub fn declared_dimension(create_table_query: &str) -> Option<usize> {
    INDEX_DIMENSION
        .captures(create_table_query)
        .or_else(|| CONSTRAINT_DIMENSION.captures(create_table_query))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Row, Serialize, Deserialize)]
pub(crate) struct TableDefinition {
    pub(crate) create_table_query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub struct SchemaManager<'a> {
    connector: &'a ClickHouseConnector,
}

impl<'a> SchemaManager<'a> {
    pub fn new(connector: &'a ClickHouseConnector) -> Self {
        Self { connector }
    }

    pub async fn verify_schema(&self) -> Result<SchemaReport> {
        let mut report = SchemaReport {
            present: Vec::new(),
            missing: Vec::new(),
        };

        for table in [EVENTS_TABLE, VECTOR_TABLE, S3_EVENTS_TABLE] {
            if self.connector.table_exists(table).await? {
                info!("Table '{}' exists", table);
                report.present.push(table.to_string());
            } else {
                warn!("Table '{}' does not exist", table);
                report.missing.push(table.to_string());
            }
        }

        Ok(report)
    }

    pub async fn create_table_query(&self, table: &str) -> Result<Option<String>> {
        let definition = self
            .connector
            .session()
            .query(
                "SELECT create_table_query FROM system.tables WHERE database = currentDatabase() AND name = ?",
            )
            .bind(table)
            .fetch_optional::<TableDefinition>()
            .await?;

        Ok(definition.map(|d| d.create_table_query))
    }

    /// Dimension baked into an existing vector table; `None` when the table is absent
    /// or its definition carries no recognisable dimension.
    pub async fn vector_dimension(&self, table: &str) -> Result<Option<usize>> {
        Ok(self
            .create_table_query(table)
            .await?
            .as_deref()
            .and_then(declared_dimension))
    }

    pub async fn drop_table(&self, table: &str) -> Result<()> {
        Validator::validate_identifier(table)?;
        warn!("Dropping table {}", table);
        self.connector.execute(&drop_table_sql(table)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::client::test_support::connector;
    use clickhouse::test::{Mock, handlers};

    #[test]
    fn test_vector_ddl_embeds_dimension_twice() {
        let ddl = vector_table_ddl(VECTOR_TABLE, 384);
        assert!(ddl.contains("CHECK length(embedding) = 384"));
        assert!(ddl.contains("vector_similarity('hnsw', 'cosineDistance', 384)"));
        assert_eq!(declared_dimension(&ddl), Some(384));
    }

    #[test]
    fn test_events_ddl_ordering_key() {
        let ddl = events_table_ddl(EVENTS_TABLE);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS events"));
        assert!(ddl.contains("ORDER BY (event_time, event_id)"));
    }

    #[test]
    fn test_declared_dimension_from_server_formatting() {
        let stored = "CREATE TABLE default.item_vectors (`item_id` UInt32, `category` LowCardinality(String), \
                      `embedding` Array(Float32) CODEC(NONE), INDEX idx_embedding_hnsw embedding \
                      TYPE vector_similarity('hnsw', 'cosineDistance', 768) GRANULARITY 1, \
                      CONSTRAINT embedding_length CHECK length(embedding) = 768) ENGINE = MergeTree ORDER BY item_id";
        assert_eq!(declared_dimension(stored), Some(768));
        assert_eq!(
            declared_dimension("CREATE TABLE t (x UInt8, CONSTRAINT c CHECK length(embedding) = 3)"),
            Some(3)
        );
        assert_eq!(declared_dimension("CREATE TABLE t (x UInt8) ENGINE = Memory"), None);
    }

    #[test]
    fn test_s3_ddl_quotes_credentials() {
        let ddl = s3_table_ddl(
            S3_EVENTS_TABLE,
            "http://minio:9000/bucket/datasets/events_*.csv",
            "key",
            "se'cret",
        );
        assert!(ddl.contains("ENGINE = S3('http://minio:9000/bucket/datasets/events_*.csv', 'key', 'se\\'cret', 'CSVWithNames')"));
    }

    #[test]
    fn test_latest_events_sql_orders_newest_first() {
        assert_eq!(
            latest_events_sql(EVENTS_TABLE),
            "SELECT ?fields FROM events ORDER BY event_time DESC, event_id DESC LIMIT ?"
        );
    }

    #[test]
    fn test_similarity_search_sql_ranks_by_ascending_distance() {
        let sql = similarity_search_sql(VECTOR_TABLE);
        assert_eq!(
            sql,
            "SELECT item_id, category, toFloat64(cosineDistance(embedding, ?)) AS score \
             FROM item_vectors ORDER BY score ASC LIMIT ?"
        );
        // vector first, limit second
        let vector_slot = sql.find("embedding, ?").unwrap();
        let limit_slot = sql.rfind("LIMIT ?").unwrap();
        assert!(vector_slot < limit_slot);
        assert_eq!(sql.matches('?').count(), 2);
    }

    #[test]
    fn test_s3_table_function_carries_structure() {
        let source = s3_table_function(
            "http://minio:9000/warehouse/datasets/events_sample.csv",
            "minio",
            "minio123",
        );
        assert_eq!(
            source,
            "s3('http://minio:9000/warehouse/datasets/events_sample.csv', 'minio', 'minio123', 'CSVWithNames', \
             'event_id UInt32, event_time DateTime(\\'UTC\\'), customer_id UInt32, event_type String, amount Decimal(10, 2)')"
        );
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("it's"), "'it\\'s'");
        assert_eq!(quote_literal("a\\b"), "'a\\\\b'");
        assert_eq!(quote_literal("why?"), "'why??'");
    }

    #[tokio::test]
    async fn test_vector_dimension_from_system_tables() {
        let mock = Mock::new();
        let connector = connector(&mock);
        let schema = SchemaManager::new(&connector);

        mock.add(handlers::provide(vec![TableDefinition {
            create_table_query: vector_table_ddl(VECTOR_TABLE, 512),
        }]));
        assert_eq!(schema.vector_dimension(VECTOR_TABLE).await.unwrap(), Some(512));

        mock.add(handlers::provide(Vec::<TableDefinition>::new()));
        assert_eq!(schema.vector_dimension(VECTOR_TABLE).await.unwrap(), None);
    }
}
