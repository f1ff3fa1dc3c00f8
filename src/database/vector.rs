// file: src/database/vector.rs
// description: vector table provisioning with dimension-aware migration and similarity search
// reference: https://clickhouse.com/docs/en/engines/table-engines/mergetree-family/annindexes

use crate::database::client::ClickHouseConnector;
use crate::database::load::{LoadStrategy, write_batch};
use crate::database::schema::{
    SchemaManager, VECTOR_TABLE, declared_dimension, similarity_search_sql, vector_table_ddl,
};
use crate::dataset::vector_dimension;
use crate::error::Result;
use crate::models::{SimilarityMatch, VectorRecord, VectorRow};
use crate::utils::validation::Validator;
use tracing::{info, warn};

/// When an existing vector table is dropped before the dataset is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VectorMigration {
    /// Keep the table when its declared dimension matches the dataset.
    #[default]
    OnDimensionChange,
    /// Drop and recreate on every provisioning run.
    AlwaysRecreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorTableAction {
    Created,
    Recreated { previous: Option<usize> },
    Kept,
}

/// Decide what to do given the stored CREATE statement (if the table exists).
pub fn plan_migration(
    existing: Option<&str>,
    dimension: usize,
    policy: VectorMigration,
) -> VectorTableAction {
    let Some(create_query) = existing else {
        return VectorTableAction::Created;
    };
    let previous = declared_dimension(create_query);

    match policy {
        VectorMigration::AlwaysRecreate => VectorTableAction::Recreated { previous },
        VectorMigration::OnDimensionChange if previous == Some(dimension) => {
            VectorTableAction::Kept
        }
        VectorMigration::OnDimensionChange => VectorTableAction::Recreated { previous },
    }
}

pub struct VectorTableManager<'a> {
    connector: &'a ClickHouseConnector,
    table: &'a str,
}

impl<'a> VectorTableManager<'a> {
    pub fn new(connector: &'a ClickHouseConnector) -> Self {
        Self {
            connector,
            table: VECTOR_TABLE,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table
    }

    /// Size the table from the records' vector width, migrating an existing table per `policy`.
    pub async fn ensure_table(
        &self,
        records: &[VectorRecord],
        policy: VectorMigration,
    ) -> Result<VectorTableAction> {
        let dimension = vector_dimension(records)?;
        let schema = SchemaManager::new(self.connector);
        let existing = schema.create_table_query(self.table).await?;
        let action = plan_migration(existing.as_deref(), dimension, policy);

        match action {
            VectorTableAction::Kept => {
                info!("Table {} already sized for dimension {}", self.table, dimension);
                return Ok(action);
            }
            VectorTableAction::Recreated { previous } => {
                warn!(
                    "Recreating {} (dimension {:?} -> {})",
                    self.table, previous, dimension
                );
                schema.drop_table(self.table).await?;
            }
            VectorTableAction::Created => {
                info!("Creating {} with dimension {}", self.table, dimension);
            }
        }

        self.connector
            .execute(&vector_table_ddl(self.table, dimension))
            .await?;
        Ok(action)
    }

    pub async fn load_sample_vectors(&self, records: &[VectorRecord]) -> Result<u64> {
        vector_dimension(records)?;
        let rows: Vec<VectorRow> = records.iter().map(VectorRow::from).collect();
        let session = self.connector.session();
        write_batch(&session, self.table, &rows, LoadStrategy::FullReplace).await
    }

    /// Nearest stored embeddings by cosine distance, closest first.
    pub async fn similarity_search(
        &self,
        query_vector: &[f32],
        limit: u64,
    ) -> Result<Vec<SimilarityMatch>> {
        Validator::validate_query_vector(query_vector)?;

        let matches = self
            .connector
            .session()
            .query(&similarity_search_sql(self.table))
            .bind(query_vector)
            .bind(limit)
            .fetch_all::<SimilarityMatch>()
            .await?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::client::test_support::connector;
    use crate::database::schema::TableDefinition;
    use crate::error::WarehouseError;
    use clickhouse::test::{Mock, handlers};
    use pretty_assertions::assert_eq;

    fn record(item_id: u32, category: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            item_id,
            category: category.to_string(),
            text: None,
            model: None,
            vector,
        }
    }

    #[test]
    fn test_plan_migration() {
        let ddl = vector_table_ddl(VECTOR_TABLE, 3);

        assert_eq!(
            plan_migration(None, 3, VectorMigration::OnDimensionChange),
            VectorTableAction::Created
        );
        assert_eq!(
            plan_migration(Some(&ddl), 3, VectorMigration::OnDimensionChange),
            VectorTableAction::Kept
        );
        assert_eq!(
            plan_migration(Some(&ddl), 768, VectorMigration::OnDimensionChange),
            VectorTableAction::Recreated { previous: Some(3) }
        );
        assert_eq!(
            plan_migration(Some(&ddl), 3, VectorMigration::AlwaysRecreate),
            VectorTableAction::Recreated { previous: Some(3) }
        );
        assert_eq!(
            plan_migration(Some("CREATE TABLE t (x UInt8) ENGINE = Memory"), 3, VectorMigration::default()),
            VectorTableAction::Recreated { previous: None }
        );
    }

    #[tokio::test]
    async fn test_ensure_table_creates_when_absent() {
        let mock = Mock::new();
        let connector = connector(&mock);
        mock.add(handlers::provide(Vec::<TableDefinition>::new()));
        let create = mock.add(handlers::record_ddl());

        let records = vec![record(1, "books", vec![0.1, 0.2, 0.3])];
        let action = VectorTableManager::new(&connector)
            .ensure_table(&records, VectorMigration::OnDimensionChange)
            .await
            .unwrap();

        assert_eq!(action, VectorTableAction::Created);
        let query = create.query().await;
        assert!(query.contains("CHECK length(embedding) = 3"));
        assert!(query.contains("vector_similarity('hnsw', 'cosineDistance', 3)"));
    }

    #[tokio::test]
    async fn test_ensure_table_recreates_on_dimension_change() {
        let mock = Mock::new();
        let connector = connector(&mock);
        mock.add(handlers::provide(vec![TableDefinition {
            create_table_query: vector_table_ddl(VECTOR_TABLE, 384),
        }]));
        let drop = mock.add(handlers::record_ddl());
        let create = mock.add(handlers::record_ddl());

        let records = vec![record(1, "home", vec![1.0, 0.0]), record(2, "beauty", vec![0.0, 1.0])];
        let action = VectorTableManager::new(&connector)
            .ensure_table(&records, VectorMigration::OnDimensionChange)
            .await
            .unwrap();

        assert_eq!(action, VectorTableAction::Recreated { previous: Some(384) });
        assert!(drop.query().await.contains("DROP TABLE IF EXISTS item_vectors"));
        assert!(create.query().await.contains("CHECK length(embedding) = 2"));
    }

    #[tokio::test]
    async fn test_ensure_table_keeps_matching_dimension() {
        let mock = Mock::new();
        let connector = connector(&mock);
        mock.add(handlers::provide(vec![TableDefinition {
            create_table_query: vector_table_ddl(VECTOR_TABLE, 2),
        }]));

        let records = vec![record(1, "home", vec![1.0, 0.0])];
        let action = VectorTableManager::new(&connector)
            .ensure_table(&records, VectorMigration::OnDimensionChange)
            .await
            .unwrap();

        assert_eq!(action, VectorTableAction::Kept);
    }

    #[tokio::test]
    async fn test_ensure_table_rejects_empty_records() {
        let mock = Mock::new();
        let connector = connector(&mock);

        let err = VectorTableManager::new(&connector)
            .ensure_table(&[], VectorMigration::OnDimensionChange)
            .await
            .unwrap_err();

        assert!(matches!(err, WarehouseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_load_sample_vectors_replaces_rows() {
        let mock = Mock::new();
        let connector = connector(&mock);
        let truncate = mock.add(handlers::record_ddl());
        let inserted = mock.add(handlers::record::<VectorRow>());

        let records = vec![record(1, "electronics", vec![0.5, 0.5]), record(2, "apparel", vec![0.1, 0.9])];
        let count = VectorTableManager::new(&connector)
            .load_sample_vectors(&records)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert!(truncate.query().await.contains("TRUNCATE TABLE IF EXISTS item_vectors"));
        let rows: Vec<VectorRow> = inserted.collect().await;
        assert_eq!(rows, records.iter().map(VectorRow::from).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_similarity_search_returns_ranked_matches() {
        let mock = Mock::new();
        let connector = connector(&mock);
        let ranked = vec![
            SimilarityMatch {
                item_id: 1,
                category: "electronics".to_string(),
                score: 0.0,
            },
            SimilarityMatch {
                item_id: 3,
                category: "home".to_string(),
                score: 0.42,
            },
        ];
        mock.add(handlers::provide(ranked.clone()));

        let matches = VectorTableManager::new(&connector)
            .similarity_search(&[0.5, 0.5], 3)
            .await
            .unwrap();

        assert_eq!(matches, ranked);
        assert_eq!(matches[0].item_id, 1);
    }

    #[tokio::test]
    async fn test_similarity_search_rejects_empty_query() {
        let mock = Mock::new();
        let connector = connector(&mock);

        let err = VectorTableManager::new(&connector)
            .similarity_search(&[], 3)
            .await
            .unwrap_err();

        assert!(matches!(err, WarehouseError::Validation(_)));
    }
}
