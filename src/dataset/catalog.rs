// file: src/dataset/catalog.rs
// description: built-in sample items embedded by the dataset generator

use crate::error::{Result, WarehouseError};
use crate::models::VectorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleItem {
    pub category: &'static str,
    pub text: &'static str,
}

pub const SAMPLE_ITEMS: [SampleItem; 5] = [
    SampleItem {
        category: "electronics",
        text: "Wireless noise-cancelling headphones with 40-hour battery life.",
    },
    SampleItem {
        category: "apparel",
        text: "Breathable running shoes designed for marathon training on city streets.",
    },
    SampleItem {
        category: "home",
        text: "Smart thermostat that learns household schedules to optimize heating and cooling.",
    },
    SampleItem {
        category: "books",
        text: "A science-fiction novel following explorers establishing the first colony on Mars.",
    },
    SampleItem {
        category: "beauty",
        text: "Vitamin C face serum targeting uneven skin tone and early-aging signs.",
    },
];

pub fn sample_texts() -> Vec<String> {
    SAMPLE_ITEMS.iter().map(|item| item.text.to_string()).collect()
}

/// Pair items with their vectors; ids are assigned from 1 in catalog order.
pub fn build_vector_records(
    items: &[SampleItem],
    vectors: Vec<Vec<f32>>,
    model_name: &str,
) -> Result<Vec<VectorRecord>> {
    if items.len() != vectors.len() {
        return Err(WarehouseError::Embedding(format!(
            "Expected {} vectors, model returned {}",
            items.len(),
            vectors.len()
        )));
    }

    Ok(items
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(idx, (item, vector))| VectorRecord {
            item_id: idx as u32 + 1,
            category: item.category.to_string(),
            text: Some(item.text.to_string()),
            model: Some(model_name.to_string()),
            vector,
        })
        .collect())
}
