// file: src/embedding/mod.rs
// description: local text embedding module exports
// reference: internal module structure

pub mod cache;
pub mod download;
pub mod encoder;
pub mod generator;

pub use cache::{DEFAULT_MODEL_CACHE_CAPACITY, ModelCache};
pub use download::{DownloadReport, ModelDownloader};
pub use encoder::{Pooling, SentenceEncoder};
pub use generator::{EmbeddingGenerator, model_directory};
