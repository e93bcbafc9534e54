//! Audit log entity models.
//!
//! Append-only trail of destructive lifecycle actions. Audit rows have no
//! `updated_at` (immutable records) and no FK to `cases`: a purge entry must
//! survive the deletion of the case it documents.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leasevault_core::types::{DbId, Timestamp};

/// `action_type` written when the scanner purges a case.
pub const ACTION_PURGE: &str = "purge";

/// `action_type` written when an owner deletes a case directly.
pub const ACTION_SELF_SERVICE_DELETE: &str = "self_service_delete";

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub action_type: String,
    pub case_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub action_type: String,
    pub case_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
}
