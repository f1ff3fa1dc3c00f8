// file: src/pipeline/mod.rs
// description: user-invoked warehouse workflows and download progress
// reference: internal module structure

pub mod bootstrap;
pub mod check;
pub mod demo;
pub mod generate;
pub mod models;
pub mod progress;

pub use bootstrap::{BootstrapOptions, BootstrapReport, run_bootstrap};
pub use check::{CheckReport, local_checks, run_check};
pub use demo::{DemoReport, VectorDemo, run_demo};
pub use generate::{GenerateOptions, GenerateReport, generate_vectors};
pub use models::{download_models, download_targets};
pub use progress::{DownloadStats, ProgressTracker};
