// file: src/config.rs
// description: application settings resolved from the environment and an optional .env file
// reference: https://docs.rs/config

use crate::error::{Result, WarehouseError};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub clickhouse: ClickHouseSettings,
    pub s3: S3Settings,
    pub models: ModelSettings,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClickHouseSettings {
    pub host: String,
    pub native_port: u16,
    pub http_port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Settings {
    pub endpoint_url: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSettings {
    pub primary: String,
    pub secondary: String,
    pub active: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    pub assets_dir: PathBuf,
    pub model_cache_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ClickHouseSettings {
    /// HTTP endpoint the client talks to.
    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }
}

impl S3Settings {
    /// Path-style object URL as the database engine expects it.
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint_url.trim_end_matches('/'),
            self.bucket,
            key.trim_start_matches('/')
        )
    }
}

const REQUIRED_S3_VARIABLES: [&str; 4] = ["S3_ENDPOINT", "S3_ACCESS_KEY", "S3_SECRET_KEY", "S3_BUCKET"];

impl Settings {
    /// Resolve settings from the process environment, reading `.env` first when present.
    /// Relative paths are anchored at the current working directory.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        let root = std::env::current_dir()?;
        Self::resolve(config::Environment::default(), &root)
    }

    /// Resolve settings from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>, root: &Path) -> Result<Self> {
        Self::resolve(config::Environment::default().source(Some(vars.into_iter().collect())), root)
    }

    fn resolve(environment: config::Environment, root: &Path) -> Result<Self> {
        let raw = config::Config::builder()
            .add_source(environment)
            .build()
            .map_err(|e| WarehouseError::Config(e.to_string()))?;
        let env = EnvLookup { raw: &raw };

        let clickhouse = ClickHouseSettings {
            host: env.or("CLICKHOUSE_HOST", "localhost"),
            native_port: env.port("CLICKHOUSE_NATIVE_PORT", 9000)?,
            http_port: env.port("CLICKHOUSE_HTTP_PORT", 8123)?,
            user: env.or("CLICKHOUSE_USER", "default"),
            password: env.or("CLICKHOUSE_PASSWORD", ""),
            database: env.or("CLICKHOUSE_DEFAULT_DATABASE", "default"),
        };

        for key in REQUIRED_S3_VARIABLES {
            env.required(key)?;
        }

        let s3 = S3Settings {
            endpoint_url: env.required("S3_ENDPOINT")?,
            region: env.or("S3_REGION", "us-east-1"),
            access_key: env.required("S3_ACCESS_KEY")?,
            secret_key: env.required("S3_SECRET_KEY")?,
            bucket: env.required("S3_BUCKET")?,
        };

        let models = ModelSettings {
            primary: env.or("EMBEDDING_MODEL_PRIMARY", "BAAI/bge-base-en-v1.5"),
            secondary: env.or(
                "EMBEDDING_MODEL_SECONDARY",
                "Alibaba-NLP/gte-Qwen2-1.5B-instruct",
            ),
            active: env.or("ACTIVE_EMBEDDING_MODEL", "BAAI/bge-base-en-v1.5"),
        };

        let paths = PathSettings {
            assets_dir: anchor(root, &env.or("ASSETS_DIR", "assets")),
            model_cache_dir: anchor(root, &env.or("MODEL_CACHE_DIR", "assets/models")),
            data_dir: anchor(root, &env.or("DATA_DIR", "assets/data")),
        };

        let settings = Settings {
            clickhouse,
            s3,
            models,
            paths,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.s3.endpoint_url)
            .map_err(|e| WarehouseError::Config(format!("S3_ENDPOINT: {}", e)))?;
        Validator::validate_identifier(&self.clickhouse.database)
            .map_err(|e| WarehouseError::Config(format!("CLICKHOUSE_DEFAULT_DATABASE: {}", e)))?;
        Ok(())
    }
}

struct EnvLookup<'a> {
    raw: &'a config::Config,
}

impl EnvLookup<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.raw.get_string(&key.to_lowercase()).ok()
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(WarehouseError::MissingVariable(key.to_string())),
        }
    }

    fn port(&self, key: &str, default: u16) -> Result<u16> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        let port = value.trim().parse::<u16>().map_err(|_| {
            WarehouseError::Config(format!("{} must be a port number, got '{}'", key, value))
        })?;
        Validator::validate_port(port)
            .map_err(|e| WarehouseError::Config(format!("{}: {}", key, e)))?;
        Ok(port)
    }
}

fn anchor(root: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
