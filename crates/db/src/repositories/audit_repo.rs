//! Repository for the append-only `audit_log` table.

use sqlx::PgPool;

use leasevault_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_log` queries.
const AUDIT_COLUMNS: &str = "id, action_type, case_id, details_json, created_at";

/// Provides append and lookup operations for the audit trail.
pub struct AuditRepo;

impl AuditRepo {
    /// Append an audit entry.
    pub async fn insert(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_log (action_type, case_id, details_json) \
             VALUES ($1, $2, $3) \
             RETURNING {AUDIT_COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(&input.action_type)
            .bind(input.case_id)
            .bind(input.details_json.as_ref())
            .fetch_one(pool)
            .await
    }

    /// All entries referencing a case, newest first. The case itself may no
    /// longer exist.
    pub async fn list_for_case(pool: &PgPool, case_id: DbId) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log \
             WHERE case_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }
}
