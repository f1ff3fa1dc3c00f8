// file: src/models/vector.rs
// description: vector dataset records and similarity search results

use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// One line of `vector_items.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub item_id: u32,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Model that produced the vector, when the generator recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub vector: Vec<f32>,
}

impl VectorRecord {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Row shape of the `item_vectors` table.
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
pub struct VectorRow {
    pub item_id: u32,
    pub category: String,
    pub embedding: Vec<f32>,
}

impl From<&VectorRecord> for VectorRow {
    fn from(record: &VectorRecord) -> Self {
        Self {
            item_id: record.item_id,
            category: record.category.clone(),
            embedding: record.vector.clone(),
        }
    }
}

/// Similarity search hit; `score` is the cosine distance (lower is more similar).
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub item_id: u32,
    pub category: String,
    pub score: f64,
}
