// file: src/storage/object_store.rs
// description: S3-compatible bucket, upload and listing operations behind a backend seam
// reference: https://docs.rs/aws-sdk-s3

use crate::config::S3Settings;
use crate::error::{Result, WarehouseError};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_REGION: &str = "us-east-1";

/// Outcome of a bucket existence check that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketProbe {
    Present,
    Missing,
    Forbidden,
}

/// Map a failed head-bucket call onto a probe outcome; `None` means the error is not ours to interpret.
pub fn classify_probe_failure(status: Option<u16>, code: Option<&str>) -> Option<BucketProbe> {
    match (status, code) {
        (Some(404), _) | (_, Some("NoSuchBucket" | "NotFound" | "404")) => Some(BucketProbe::Missing),
        (Some(403), _) | (_, Some("AccessDenied" | "Forbidden" | "403")) => {
            Some(BucketProbe::Forbidden)
        }
        _ => None,
    }
}

#[async_trait]
pub trait ObjectStoreBackend: Send + Sync {
    async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe>;

    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Single-shot upload of a local file.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Every key under `prefix`, across all result pages.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}

pub struct S3Backend {
    client: Client,
    region: String,
}

impl S3Backend {
    pub fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "warehouse-settings",
        );

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(settings.endpoint_url.clone())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
            region: settings.region.clone(),
        }
    }
}

#[async_trait]
impl ObjectStoreBackend for S3Backend {
    async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(BucketProbe::Present),
            Err(err) => {
                let status = err.raw_response().map(|r| r.status().as_u16());
                match classify_probe_failure(status, err.code()) {
                    Some(probe) => Ok(probe),
                    None => Err(aws_sdk_s3::Error::from(err).into()),
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(aws_sdk_s3::Error::from)?;
        Ok(())
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| WarehouseError::ObjectStoreIo {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(aws_sdk_s3::Error::from)?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(keys)
    }
}

/// Bucket-scoped operations used by the workflows.
pub struct ObjectStoreManager<B: ObjectStoreBackend> {
    backend: B,
    bucket: String,
}

impl ObjectStoreManager<S3Backend> {
    pub fn from_settings(settings: &S3Settings) -> Self {
        Self::new(S3Backend::new(settings), &settings.bucket)
    }
}

impl<B: ObjectStoreBackend> ObjectStoreManager<B> {
    pub fn new(backend: B, bucket: &str) -> Self {
        Self {
            backend,
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read-only existence check; a denied probe is reported as `PermissionDenied`.
    pub async fn bucket_exists(&self) -> Result<bool> {
        match self.backend.probe_bucket(&self.bucket).await? {
            BucketProbe::Present => Ok(true),
            BucketProbe::Missing => Ok(false),
            BucketProbe::Forbidden => {
                warn!("Access to bucket {} denied", self.bucket);
                Err(WarehouseError::PermissionDenied {
                    bucket: self.bucket.clone(),
                })
            }
        }
    }

    /// Create the bucket if it does not exist. Returns `true` when it was created.
    pub async fn ensure_bucket_exists(&self) -> Result<bool> {
        if self.bucket_exists().await? {
            debug!("Bucket {} already exists", self.bucket);
            return Ok(false);
        }

        info!("Creating bucket {}", self.bucket);
        self.backend.create_bucket(&self.bucket).await?;
        Ok(true)
    }

    pub async fn upload_file(&self, path: &Path, key: &str) -> Result<()> {
        if !path.exists() {
            return Err(WarehouseError::SourceFileMissing {
                path: path.to_path_buf(),
            });
        }

        info!("Uploading {} -> s3://{}/{}", path.display(), self.bucket, key);
        self.backend.put_file(&self.bucket, key, path).await
    }

    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = self.backend.list_keys(&self.bucket, prefix).await?;
        debug!("{} objects under s3://{}/{}", keys.len(), self.bucket, prefix);
        Ok(keys)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    /// In-memory backend; keys are listed in lexicographic order like a real bucket.
    #[derive(Default)]
    pub struct MemoryBackend {
        pub buckets: Mutex<BTreeSet<String>>,
        pub forbidden: BTreeSet<String>,
        pub objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
        pub create_calls: Mutex<usize>,
        /// When set, listing fails with this message.
        pub list_failure: Option<String>,
    }

    impl MemoryBackend {
        pub fn with_bucket(bucket: &str) -> Self {
            let backend = Self::default();
            backend.buckets.lock().unwrap().insert(bucket.to_string());
            backend
        }

        pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl ObjectStoreBackend for MemoryBackend {
        async fn probe_bucket(&self, bucket: &str) -> Result<BucketProbe> {
            if self.forbidden.contains(bucket) {
                return Ok(BucketProbe::Forbidden);
            }
            Ok(if self.buckets.lock().unwrap().contains(bucket) {
                BucketProbe::Present
            } else {
                BucketProbe::Missing
            })
        }

        async fn create_bucket(&self, bucket: &str) -> Result<()> {
            *self.create_calls.lock().unwrap() += 1;
            self.buckets.lock().unwrap().insert(bucket.to_string());
            Ok(())
        }

        async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
            let bytes = std::fs::read(path)?;
            self.objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), bytes);
            Ok(())
        }

        async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            if let Some(message) = &self.list_failure {
                return Err(WarehouseError::ObjectStoreIo {
                    path: format!("s3://{}/{}", bucket, prefix).into(),
                    message: message.clone(),
                });
            }
            Ok(self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|(b, k)| b == bucket && k.starts_with(prefix))
                .map(|(_, k)| k.clone())
                .collect())
        }
    }
}
