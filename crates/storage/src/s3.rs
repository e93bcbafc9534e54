//! S3 object storage provider.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use crate::error::StorageError;
use crate::{DeleteReport, ObjectStorage};

/// S3 limits DeleteObjects to 1000 keys per request.
const DELETE_BATCH_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// S3Config
// ---------------------------------------------------------------------------

/// Configuration for the S3 storage provider.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket holding all vault objects.
    pub bucket: String,
    /// Optional region override; the SDK's default chain applies otherwise.
    pub region: Option<String>,
    /// Optional custom endpoint (MinIO, localstack). Enables path-style
    /// addressing.
    pub endpoint_url: Option<String>,
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `S3_BUCKET` is not set, signalling that object
    /// storage is not configured and the local fallback should be used.
    ///
    /// | Variable          | Required | Default |
    /// |-------------------|----------|---------|
    /// | `S3_BUCKET`       | yes      | —       |
    /// | `S3_REGION`       | no       | SDK default chain |
    /// | `S3_ENDPOINT_URL` | no       | —       |
    pub fn from_env() -> Option<Self> {
        let bucket = std::env::var("S3_BUCKET").ok()?;
        Some(Self {
            bucket,
            region: std::env::var("S3_REGION").ok(),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// S3Storage
// ---------------------------------------------------------------------------

/// Stores vault objects in a single S3 bucket, keyed by storage path.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    /// Build a client from the configuration and the SDK's default
    /// credential chain.
    pub async fn new(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn delete_objects(&self, paths: &[String]) -> Result<DeleteReport, StorageError> {
        let mut report = DeleteReport::default();

        for chunk in paths.chunks(DELETE_BATCH_SIZE) {
            let objects: Vec<ObjectIdentifier> = chunk
                .iter()
                .map(|path| {
                    ObjectIdentifier::builder()
                        .key(path)
                        .build()
                        .map_err(|e| StorageError::Provider(e.to_string()))
                })
                .collect::<Result<_, _>>()?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| StorageError::Provider(e.to_string()))?;

            let response = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| StorageError::Provider(e.to_string()))?;

            report.deleted += response.deleted().len();
            for err in response.errors() {
                let key = err.key().unwrap_or("<unknown>").to_string();
                tracing::warn!(
                    bucket = %self.bucket,
                    key = %key,
                    message = err.message().unwrap_or(""),
                    "S3 object delete failed"
                );
                report.failed.push(key);
            }
        }

        Ok(report)
    }

    async fn signed_url(&self, path: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
