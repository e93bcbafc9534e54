//! Local filesystem storage provider.
//!
//! Fallback for environments without an S3 bucket (development, tests).
//! Objects live under a root directory, keyed by their storage path.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::{DeleteReport, ObjectStorage};

/// Stores vault objects as plain files under a root directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a provider rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn delete_objects(&self, paths: &[String]) -> Result<DeleteReport, StorageError> {
        let mut report = DeleteReport::default();

        for path in paths {
            let full = self.root.join(path);
            match tokio::fs::remove_file(&full).await {
                Ok(()) => report.deleted += 1,
                // Already gone counts as removed.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(path = %full.display(), error = %e, "Local object delete failed");
                    report.failed.push(path.clone());
                }
            }
        }

        Ok(report)
    }

    async fn signed_url(&self, path: &str, _expires_in: Duration) -> Result<String, StorageError> {
        // No signing locally; hand back a file URL.
        Ok(format!("file://{}", self.root.join(path).display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leasevault-storage-{label}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn deletes_existing_files() {
        let root = scratch_dir("delete");
        tokio::fs::write(root.join("a.jpg"), b"bytes").await.unwrap();

        let storage = LocalStorage::new(root.clone());
        let report = storage
            .delete_objects(&["a.jpg".to_string()])
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert!(report.failed.is_empty());
        assert!(!root.join("a.jpg").exists());
    }

    #[tokio::test]
    async fn missing_files_count_as_deleted() {
        let storage = LocalStorage::new(scratch_dir("missing"));
        let report = storage
            .delete_objects(&["never-existed.jpg".to_string()])
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn signed_url_points_into_root() {
        let root = scratch_dir("url");
        let storage = LocalStorage::new(root.clone());
        let url = storage
            .signed_url("case/1/photo.jpg", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("case/1/photo.jpg"));
    }
}
