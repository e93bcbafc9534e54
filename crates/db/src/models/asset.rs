//! Asset entity models.
//!
//! An asset is a stored file owned by exactly one case. Rows are removed by
//! cascade when their case is deleted; the underlying storage object is the
//! caller's responsibility (scanner purge or self-service deletion).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leasevault_core::types::{DbId, Timestamp};

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub case_id: DbId,
    /// Evidence phase the file belongs to, if any.
    pub phase: Option<String>,
    pub kind: String,
    pub storage_path: String,
    pub file_size_bytes: i64,
    pub created_at: Timestamp,
}

/// DTO for registering an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAsset {
    pub phase: Option<String>,
    pub kind: String,
    pub storage_path: String,
    pub file_size_bytes: Option<i64>,
}
