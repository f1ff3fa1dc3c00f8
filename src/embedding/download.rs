// file: src/embedding/download.rs
// description: snapshot embedding models from the Hugging Face hub into the local model cache
// reference: https://docs.rs/hf-hub

use crate::embedding::generator::model_directory;
use crate::error::{Result, WarehouseError};
use crate::pipeline::progress::{DownloadStats, ProgressTracker};
use hf_hub::api::tokio::{Api, ApiBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Files a local sentence encoder reads; anything else in the repository is left on the hub.
const MODEL_FILES: [&str; 8] = [
    "config.json",
    "tokenizer.json",
    "tokenizer_config.json",
    "special_tokens_map.json",
    "vocab.txt",
    "modules.json",
    "sentence_bert_config.json",
    "config_sentence_transformers.json",
];
const POOLING_PREFIX: &str = "1_Pooling/";
const WEIGHTS_INDEX: &str = "model.safetensors.index.json";

#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub model: String,
    pub target_dir: PathBuf,
    pub stats: DownloadStats,
}

pub struct ModelDownloader {
    api: Api,
    cache_root: PathBuf,
    colored: bool,
}

impl ModelDownloader {
    pub fn new(cache_root: &Path, colored: bool) -> Result<Self> {
        let api = ApiBuilder::new()
            .with_progress(false)
            .build()
            .map_err(|e| WarehouseError::ModelHub(e.to_string()))?;

        Ok(Self {
            api,
            cache_root: cache_root.to_path_buf(),
            colored,
        })
    }

    /// Fetch the model into `model_directory(model_name)`. Files already present are kept,
    /// so an interrupted download resumes where it stopped.
    pub async fn download(&self, model_name: &str) -> Result<DownloadReport> {
        let target_dir = model_directory(model_name, &self.cache_root);
        info!("Downloading {} -> {}", model_name, target_dir.display());
        fs::create_dir_all(&target_dir)?;

        let repo = self.api.model(model_name.to_string());
        let listing = repo.info().await.map_err(|e| {
            WarehouseError::ModelHub(format!("Failed to list files for {}: {}", model_name, e))
        })?;

        let wanted = select_model_files(listing.siblings.iter().map(|s| s.rfilename.as_str()));
        if !wanted.iter().any(|file| is_weight_file(file)) {
            return Err(WarehouseError::ModelHub(format!(
                "Repository {} has no safetensors weights",
                model_name
            )));
        }

        let tracker = ProgressTracker::with_color(wanted.len(), self.colored);
        for file in &wanted {
            let destination = target_dir.join(file);
            if destination.exists() {
                debug!("Keeping existing {}", destination.display());
                tracker.file_skipped();
                continue;
            }

            tracker.start_file(file);
            let cached = repo.get(file).await.map_err(|e| {
                WarehouseError::ModelHub(format!("Failed to fetch {}/{}: {}", model_name, file, e))
            })?;

            let bytes = install_file(&cached, &destination)?;
            tracker.file_fetched(bytes);
        }
        tracker.finish();

        Ok(DownloadReport {
            model: model_name.to_string(),
            target_dir,
            stats: tracker.get_stats(),
        })
    }
}

/// Top-level safetensors weights, single-file or sharded, and the shard index.
pub fn is_weight_file(name: &str) -> bool {
    name == WEIGHTS_INDEX || (!name.contains('/') && name.ends_with(".safetensors"))
}

/// Keep the encoder files, weights and pooling descriptor, in a stable order.
pub fn select_model_files<'a>(listing: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut selected: Vec<String> = listing
        .filter(|name| {
            MODEL_FILES.contains(name) || is_weight_file(name) || name.starts_with(POOLING_PREFIX)
        })
        .map(str::to_string)
        .collect();
    selected.sort();
    selected.dedup();
    selected
}

/// Copy a hub-cached file into the model directory. The copy lands in a staging file
/// beside the destination and is renamed into place, so an interrupted copy never
/// leaves a truncated file under the final name.
fn install_file(cached: &Path, destination: &Path) -> Result<u64> {
    let parent = destination.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut staging = NamedTempFile::new_in(parent)?;
    let mut source = fs::File::open(cached)?;
    let bytes = std::io::copy(&mut source, staging.as_file_mut())?;
    staging.as_file().sync_all()?;

    staging
        .persist(destination)
        .map_err(|e| WarehouseError::Io(e.error))?;
    Ok(bytes)
}
