use leasevault_core::error::CoreError;
use leasevault_notify::EmailError;

/// Error type for lifecycle operations.
///
/// Wraps the domain error for validation/not-found outcomes and the
/// collaborator errors the scanner treats as transient (retried on the next
/// scheduled run, never fatal to a batch).
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A domain-level error (validation, missing case, invariant breach).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An email send failure.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),
}
