// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod event;
pub mod vector;

pub use event::{Amount, ParseAmountError, TabularEvent};
pub use vector::{SimilarityMatch, VectorRecord, VectorRow};
