// file: src/pipeline/generate.rs
// description: embed the sample catalog and write the vector dataset
// reference: runs the local encoder once over the whole catalog

use crate::config::Settings;
use crate::dataset::{SAMPLE_ITEMS, build_vector_records, sample_texts, vector_dataset_path, write_jsonl};
use crate::embedding::EmbeddingGenerator;
use crate::error::{Result, WarehouseError};
use crate::models::VectorRecord;
use crate::utils::display::vector_preview_table;
use crate::utils::logging::{format_info, format_success};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Overrides `ACTIVE_EMBEDDING_MODEL`.
    pub model: Option<String>,
    /// Defaults to `<DATA_DIR>/vector_items.jsonl`.
    pub output: Option<PathBuf>,
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub model: String,
    pub output: PathBuf,
    pub records: Vec<VectorRecord>,
}

/// Nothing is written unless every embedding was produced.
pub fn generate_vectors(
    settings: &Settings,
    generator: &mut EmbeddingGenerator,
    options: GenerateOptions,
) -> Result<GenerateReport> {
    let model = options
        .model
        .unwrap_or_else(|| settings.models.active.clone());
    let output = options
        .output
        .unwrap_or_else(|| vector_dataset_path(&settings.paths));

    if output.exists() && !options.overwrite {
        return Err(WarehouseError::OutputExists { path: output });
    }

    println!("{}", format_info(&format!("Using embedding model: {}", model)));
    let vectors = generator.embed_texts(&sample_texts(), &model)?;
    let records = build_vector_records(&SAMPLE_ITEMS, vectors, &model)?;

    write_jsonl(&records, &output, options.overwrite)?;
    info!("Wrote {} vector records to {}", records.len(), output.display());

    println!(
        "{}",
        format_success(&format!("Vector dataset written to {}", output.display()))
    );
    println!("{}", vector_preview_table(&records));

    Ok(GenerateReport {
        model,
        output,
        records,
    })
}
