// file: src/dataset/mod.rs
// description: local dataset files module exports
// reference: internal module structure

pub mod catalog;
pub mod loader;
pub mod writer;

pub use catalog::{SAMPLE_ITEMS, SampleItem, build_vector_records, sample_texts};
pub use loader::{
    TABULAR_DATASET_FILENAME, VECTOR_DATASET_FILENAME, load_tabular_events, load_vector_items,
    read_tabular_events, read_vector_items, tabular_dataset_path, vector_dataset_path,
    vector_dimension,
};
pub use writer::write_jsonl;
