/// Error type for storage provider failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The provider rejected or failed the request as a whole.
    #[error("Storage provider error: {0}")]
    Provider(String),

    /// A presigned URL could not be generated.
    #[error("Presigning failed: {0}")]
    Presign(String),

    /// Local filesystem failure outside the per-path best-effort handling.
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
