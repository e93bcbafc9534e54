//! Repository for the `cases` table.
//!
//! Besides plain CRUD this carries the lifecycle queries and guarded
//! mutations the transition scanner and purchase ingestion drive the state
//! machine with. Every guarded UPDATE re-checks its precondition so a
//! concurrent or retried invocation re-applies as a no-op.

use sqlx::{PgConnection, PgPool};

use leasevault_core::entitlements::Phase;
use leasevault_core::retention::{MAX_REMINDER_LEVEL, REMINDER_WINDOW_DAYS};
use leasevault_core::types::{DbId, Timestamp};

use crate::models::case::{Case, CaseWithOwner, CreateCase, PurchaseEffects};

/// Column list for `cases` queries.
const CASE_COLUMNS: &str = "\
    id, owner_id, title, stay_type, \
    checkin_completed_at, handover_completed_at, \
    retention_until, storage_years_purchased, \
    deletion_status, grace_until, retention_reminder_level, \
    expiry_notified_at, final_expiry_notified_at, purchase_type, \
    created_at, updated_at";

/// Provides CRUD and lifecycle operations for cases.
pub struct CaseRepo;

impl CaseRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Create a new case. Starts `active` with no retention protection.
    pub async fn create(pool: &PgPool, input: &CreateCase) -> Result<Case, sqlx::Error> {
        let query = format!(
            "INSERT INTO cases (owner_id, title, stay_type) \
             VALUES ($1, $2, $3) \
             RETURNING {CASE_COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(input.owner_id)
            .bind(&input.title)
            .bind(input.stay_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a case by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Case>, sqlx::Error> {
        let query = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = $1");
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all cases belonging to an owner, newest first.
    pub async fn list_for_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM cases \
             WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Seal a phase by stamping its completion timestamp.
    ///
    /// Sealing is permanent: the UPDATE only matches while the column is
    /// still NULL, so a second seal attempt returns `None` and the original
    /// timestamp survives.
    pub async fn seal_phase(
        pool: &PgPool,
        id: DbId,
        phase: Phase,
        now: Timestamp,
    ) -> Result<Option<Case>, sqlx::Error> {
        let column = match phase {
            Phase::Checkin => "checkin_completed_at",
            Phase::Handover => "handover_completed_at",
        };
        let query = format!(
            "UPDATE cases SET {column} = $2, updated_at = $2 \
             WHERE id = $1 AND {column} IS NULL \
             RETURNING {CASE_COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete a case immediately (deliberate self-service deletion).
    ///
    /// Owned rows cascade. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Scanner queries
    // -----------------------------------------------------------------------

    /// Active cases inside the widest reminder window whose stored level may
    /// still rise, joined with the owner's email.
    ///
    /// Cases without a retention deadline are exempt from all reminder and
    /// expiry processing and never match.
    pub async fn list_reminder_candidates(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<CaseWithOwner>, sqlx::Error> {
        let query = format!(
            "SELECT c.{}, u.email AS owner_email \
             FROM cases c \
             JOIN users u ON u.id = c.owner_id \
             WHERE c.deletion_status = 'active' \
               AND c.retention_until IS NOT NULL \
               AND c.retention_until > $1 \
               AND c.retention_until <= $1 + make_interval(days => $2) \
               AND c.retention_reminder_level < $3 \
             ORDER BY c.retention_until",
            CASE_COLUMNS.replace(", ", ", c.")
        );
        sqlx::query_as::<_, CaseWithOwner>(&query)
            .bind(now)
            .bind(REMINDER_WINDOW_DAYS[0] as i32)
            .bind(MAX_REMINDER_LEVEL)
            .fetch_all(pool)
            .await
    }

    /// Active cases whose retention deadline has passed.
    pub async fn list_expired(pool: &PgPool, now: Timestamp) -> Result<Vec<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM cases \
             WHERE deletion_status = 'active' \
               AND retention_until IS NOT NULL \
               AND retention_until < $1 \
             ORDER BY retention_until"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Pending-deletion cases whose grace period has run out.
    pub async fn list_grace_expired(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM cases \
             WHERE deletion_status = 'pending_deletion' \
               AND grace_until < $1 \
             ORDER BY grace_until"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Guarded lifecycle mutations
    // -----------------------------------------------------------------------

    /// Record a successfully sent reminder by raising the stored level.
    ///
    /// The level is the at-least-once delivery acknowledgment: it only moves
    /// up, and only past sends move it, so a failed send is retried on the
    /// next scan and a duplicate scan run matches zero rows. Reaching the
    /// 30-day window stamps `expiry_notified_at` once; the final window
    /// stamps `final_expiry_notified_at` once.
    pub async fn record_reminder_sent(
        pool: &PgPool,
        id: DbId,
        level: i16,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cases SET \
                retention_reminder_level = $2, \
                expiry_notified_at = CASE WHEN $2 >= 2 \
                    THEN COALESCE(expiry_notified_at, $3) ELSE expiry_notified_at END, \
                final_expiry_notified_at = CASE WHEN $2 >= 3 \
                    THEN COALESCE(final_expiry_notified_at, $3) ELSE final_expiry_notified_at END, \
                updated_at = $3 \
             WHERE id = $1 \
               AND deletion_status = 'active' \
               AND retention_reminder_level < $2",
        )
        .bind(id)
        .bind(level)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move an expired case into its deletion grace period.
    ///
    /// One-way: the WHERE clause re-checks both the status and the expiry, so
    /// a case revived by a purchase between query and update is left alone.
    pub async fn mark_pending_deletion(
        pool: &PgPool,
        id: DbId,
        grace_until: Timestamp,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cases SET \
                deletion_status = 'pending_deletion', \
                grace_until = $2, \
                updated_at = $3 \
             WHERE id = $1 \
               AND deletion_status = 'active' \
               AND retention_until IS NOT NULL \
               AND retention_until < $3",
        )
        .bind(id)
        .bind(grace_until)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a case whose grace period has run out.
    ///
    /// Storage objects must already have been dealt with; owned rows cascade.
    /// The guard re-checks the status and deadline so a case revived after
    /// the purge list was read survives.
    pub async fn delete_purged(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM cases \
             WHERE id = $1 \
               AND deletion_status = 'pending_deletion' \
               AND grace_until < $2",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply the case-row effects of a purchase inside the caller's
    /// transaction (the ledger insert and this update commit together).
    pub async fn apply_purchase_effects(
        conn: &mut PgConnection,
        id: DbId,
        effects: &PurchaseEffects,
        now: Timestamp,
    ) -> Result<Case, sqlx::Error> {
        let query = format!(
            "UPDATE cases SET \
                retention_until = COALESCE($2, retention_until), \
                purchase_type = COALESCE($3, purchase_type), \
                storage_years_purchased = storage_years_purchased + $4, \
                retention_reminder_level = CASE WHEN $5 THEN 0 ELSE retention_reminder_level END, \
                expiry_notified_at = CASE WHEN $5 THEN NULL ELSE expiry_notified_at END, \
                final_expiry_notified_at = CASE WHEN $5 THEN NULL ELSE final_expiry_notified_at END, \
                deletion_status = CASE WHEN $6 THEN 'active' ELSE deletion_status END, \
                grace_until = CASE WHEN $6 THEN NULL ELSE grace_until END, \
                updated_at = $7 \
             WHERE id = $1 \
             RETURNING {CASE_COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .bind(effects.retention_until)
            .bind(effects.purchase_type.as_deref())
            .bind(effects.add_storage_years)
            .bind(effects.reset_reminders)
            .bind(effects.reactivate)
            .bind(now)
            .fetch_one(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Count cases per deletion status: (active, pending_deletion).
    pub async fn count_by_status(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT \
                COUNT(*) FILTER (WHERE deletion_status = 'active'), \
                COUNT(*) FILTER (WHERE deletion_status = 'pending_deletion') \
             FROM cases",
        )
        .fetch_one(pool)
        .await?;
        Ok(row)
    }
}
