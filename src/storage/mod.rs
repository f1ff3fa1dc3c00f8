// file: src/storage/mod.rs
// description: object storage module exports
// reference: internal module structure

pub mod mapped;
pub mod object_store;

pub use mapped::{MAPPED_DATASET_PATTERN, S3DatasetMapper, STAGED_DATASET_KEY, write_events_csv};
pub use object_store::{
    BucketProbe, ObjectStoreBackend, ObjectStoreManager, S3Backend, classify_probe_failure,
};
