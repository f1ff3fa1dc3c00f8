// file: src/embedding/encoder.rs
// description: sentence encoder loaded from a local model directory (BERT family, CPU)
// reference: https://docs.rs/candle-transformers

use crate::error::{Result, WarehouseError};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info};

pub const MAX_SEQ_LEN: usize = 512;

const SUPPORTED_MODEL_TYPES: [&str; 4] = ["bert", "roberta", "xlm-roberta", "camembert"];
const NORMALIZE_MODULE: &str = "sentence_transformers.models.Normalize";
const SINGLE_WEIGHTS: &str = "model.safetensors";
const WEIGHTS_INDEX: &str = "model.safetensors.index.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    Cls,
    Mean,
}

#[derive(Debug, Deserialize)]
struct ModelManifest {
    #[serde(default)]
    model_type: Option<String>,
    hidden_size: usize,
}

#[derive(Debug, Default, Deserialize)]
struct PoolingConfig {
    #[serde(default)]
    pooling_mode_cls_token: bool,
    #[serde(default)]
    pooling_mode_mean_tokens: bool,
}

#[derive(Debug, Deserialize)]
struct WeightsIndex {
    weight_map: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    #[serde(rename = "type")]
    kind: String,
}

pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    pooling: Pooling,
    normalize: bool,
    dimension: usize,
}

impl SentenceEncoder {
    /// Load weights, tokenizer and sentence-transformers descriptors from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading embedding model from {}", dir.display());

        let manifest: ModelManifest = read_json(&dir.join("config.json"))?;
        if let Some(model_type) = manifest.model_type.as_deref() {
            if !SUPPORTED_MODEL_TYPES.contains(&model_type) {
                return Err(WarehouseError::Embedding(format!(
                    "Unsupported model architecture '{}' in {} (supported: {})",
                    model_type,
                    dir.display(),
                    SUPPORTED_MODEL_TYPES.join(", ")
                )));
            }
        }
        let bert_config: BertConfig = read_json(&dir.join("config.json"))?;

        let mut tokenizer = Tokenizer::from_file(dir.join("tokenizer.json"))
            .map_err(|e| WarehouseError::Embedding(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| WarehouseError::Embedding(format!("Failed to configure tokenizer: {}", e)))?;

        let weights = weight_files(dir)?;

        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, DTYPE, &device) }
            .map_err(candle_error)?;
        let model = BertModel::load(vb, &bert_config).map_err(candle_error)?;

        let pooling = detect_pooling(dir)?;
        let normalize = detect_normalize(dir)?;
        debug!(
            "Model ready: dimension={} pooling={:?} normalize={}",
            manifest.hidden_size, pooling, normalize
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            pooling,
            normalize,
            dimension: manifest.hidden_size,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }

    /// Encode all texts in one batch; output order follows input order.
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| WarehouseError::Embedding(format!("Tokenization failed: {}", e)))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device).map_err(candle_error)?;
        let token_type_ids =
            Tensor::from_vec(type_ids, (batch, seq_len), &self.device).map_err(candle_error)?;
        let attention_mask =
            Tensor::from_vec(mask, (batch, seq_len), &self.device).map_err(candle_error)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_error)?;

        let pooled = match self.pooling {
            Pooling::Cls => hidden_states
                .narrow(1, 0, 1)
                .and_then(|t| t.squeeze(1))
                .map_err(candle_error)?,
            Pooling::Mean => mean_pool(&hidden_states, &attention_mask).map_err(candle_error)?,
        };

        let pooled = if self.normalize {
            l2_normalize(&pooled).map_err(candle_error)?
        } else {
            pooled
        };

        pooled
            .to_dtype(DType::F32)
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(candle_error)
    }
}

fn mean_pool(hidden_states: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    // [batch, seq, 1] so the mask broadcasts over the hidden dimension
    let mask = attention_mask.to_dtype(hidden_states.dtype())?.unsqueeze(2)?;
    let summed = hidden_states.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

fn l2_normalize(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    let norm = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
    embeddings.broadcast_div(&norm)
}

/// `model.safetensors`, or every shard named in `model.safetensors.index.json`.
fn weight_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let single = dir.join(SINGLE_WEIGHTS);
    if single.exists() {
        return Ok(vec![single]);
    }

    let index_path = dir.join(WEIGHTS_INDEX);
    if !index_path.exists() {
        return Err(WarehouseError::Embedding(format!(
            "No {} or {} in {}",
            SINGLE_WEIGHTS,
            WEIGHTS_INDEX,
            dir.display()
        )));
    }

    let index: WeightsIndex = read_json(&index_path)?;
    let shards: BTreeSet<&str> = index.weight_map.values().map(String::as_str).collect();
    if shards.is_empty() {
        return Err(WarehouseError::Embedding(format!(
            "{} lists no shards",
            index_path.display()
        )));
    }

    shards
        .into_iter()
        .map(|shard| {
            let path = dir.join(shard);
            if path.exists() {
                Ok(path)
            } else {
                Err(WarehouseError::Embedding(format!(
                    "Missing weight shard {} (re-run download-models)",
                    path.display()
                )))
            }
        })
        .collect()
}

fn detect_pooling(dir: &Path) -> Result<Pooling> {
    let path = dir.join("1_Pooling").join("config.json");
    if !path.exists() {
        return Ok(Pooling::Mean);
    }

    let config: PoolingConfig = read_json(&path)?;
    Ok(pooling_from_config(&config))
}

fn pooling_from_config(config: &PoolingConfig) -> Pooling {
    if config.pooling_mode_cls_token && !config.pooling_mode_mean_tokens {
        Pooling::Cls
    } else {
        Pooling::Mean
    }
}

fn detect_normalize(dir: &Path) -> Result<bool> {
    let path = dir.join("modules.json");
    if !path.exists() {
        return Ok(false);
    }

    let modules: Vec<ModuleEntry> = read_json(&path)?;
    Ok(modules.iter().any(|m| m.kind == NORMALIZE_MODULE))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| {
        WarehouseError::Embedding(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        WarehouseError::Embedding(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn candle_error(err: candle_core::Error) -> WarehouseError {
    WarehouseError::Embedding(err.to_string())
}
