//! Object storage collaborator.
//!
//! File bytes live with an external provider; this crate only exposes the two
//! operations the lifecycle needs: delete-by-path (purge, self-service
//! deletion) and signed download URLs (asset listings). Production uses the
//! S3 implementation; unconfigured environments fall back to a local
//! filesystem store.

use std::time::Duration;

use async_trait::async_trait;

pub mod error;
pub mod local;
pub mod s3;

pub use error::StorageError;
pub use local::LocalStorage;
pub use s3::{S3Config, S3Storage};

/// Outcome of a bulk delete. Paths that could not be removed are reported,
/// not fatal: the lifecycle logs them and proceeds.
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    /// Number of objects confirmed removed.
    pub deleted: usize,
    /// Paths the provider failed to remove.
    pub failed: Vec<String>,
}

/// Provider interface for stored file bytes.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Remove the given objects, best-effort. Individual failures land in
    /// the report; the call itself only errors when the provider is
    /// unreachable outright.
    async fn delete_objects(&self, paths: &[String]) -> Result<DeleteReport, StorageError>;

    /// A time-limited download URL for one object.
    async fn signed_url(&self, path: &str, expires_in: Duration) -> Result<String, StorageError>;
}
