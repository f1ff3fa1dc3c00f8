// file: src/embedding/generator.rs
// description: text embedding front door with model directory resolution and caching

use crate::config::PathSettings;
use crate::embedding::cache::ModelCache;
use crate::embedding::encoder::SentenceEncoder;
use crate::error::{Result, WarehouseError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Cache directory for a hub model name: `BAAI/bge-base-en-v1.5` -> `<root>/BAAI__bge-base-en-v1.5`.
pub fn model_directory(model_name: &str, cache_root: &Path) -> PathBuf {
    cache_root.join(model_name.replace('/', "__"))
}

pub struct EmbeddingGenerator {
    cache_root: PathBuf,
    cache: ModelCache<Arc<SentenceEncoder>>,
}

impl EmbeddingGenerator {
    pub fn new(paths: &PathSettings, cache: ModelCache<Arc<SentenceEncoder>>) -> Self {
        Self {
            cache_root: paths.model_cache_dir.clone(),
            cache,
        }
    }

    pub fn model_directory(&self, model_name: &str) -> PathBuf {
        model_directory(model_name, &self.cache_root)
    }

    pub fn cached_models(&self) -> Vec<&str> {
        self.cache.names()
    }

    fn model(&mut self, model_name: &str) -> Result<Arc<SentenceEncoder>> {
        let dir = self.model_directory(model_name);

        self.cache.get_or_try_load(model_name, || {
            if !dir.exists() {
                return Err(WarehouseError::ModelNotFound {
                    model: model_name.to_string(),
                    path: dir.clone(),
                });
            }
            SentenceEncoder::load(&dir).map(Arc::new)
        })
    }

    pub fn embed_texts(&mut self, texts: &[String], model_name: &str) -> Result<Vec<Vec<f32>>> {
        let model = self.model(model_name)?;
        debug!("Encoding {} texts with {}", texts.len(), model_name);

        let vectors = model.encode(texts)?;
        if vectors.len() != texts.len() {
            return Err(WarehouseError::Embedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        info!(
            "Generated {} embeddings of dimension {} with {}",
            vectors.len(),
            model.dimension(),
            model_name
        );
        Ok(vectors)
    }

    pub fn embedding_dimension(&mut self, model_name: &str) -> Result<usize> {
        Ok(self.model(model_name)?.dimension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(root: &Path) -> PathSettings {
        PathSettings {
            assets_dir: root.to_path_buf(),
            model_cache_dir: root.join("models"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn test_model_directory_is_filesystem_safe() {
        assert_eq!(
            model_directory("BAAI/bge-base-en-v1.5", Path::new("/cache")),
            PathBuf::from("/cache/BAAI__bge-base-en-v1.5")
        );
        assert_eq!(
            model_directory("plain-model", Path::new("/cache")),
            PathBuf::from("/cache/plain-model")
        );
    }

    #[test]
    fn test_missing_model_is_distinguished() {
        let temp = TempDir::new().unwrap();
        let mut generator = EmbeddingGenerator::new(&paths(temp.path()), ModelCache::default());

        let err = generator
            .embed_texts(&["hello".to_string()], "BAAI/bge-base-en-v1.5")
            .unwrap_err();
        match err {
            WarehouseError::ModelNotFound { model, path } => {
                assert_eq!(model, "BAAI/bge-base-en-v1.5");
                assert!(path.ends_with("BAAI__bge-base-en-v1.5"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            generator.embedding_dimension("BAAI/bge-base-en-v1.5"),
            Err(WarehouseError::ModelNotFound { .. })
        ));
        assert!(generator.cached_models().is_empty());
    }
}
