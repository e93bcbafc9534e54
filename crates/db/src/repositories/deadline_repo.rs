//! Repository for the `lease_deadlines` table.

use chrono::NaiveDate;
use sqlx::PgPool;

use leasevault_core::deadlines::DEFAULT_NOTIFY_OFFSETS;
use leasevault_core::types::{DbId, Timestamp};

use crate::models::deadline::{CreateDeadline, DeadlineWithCase, LeaseDeadline};

/// Column list for `lease_deadlines` queries.
const DEADLINE_COLUMNS: &str = "\
    id, case_id, label, due_on, notify_offsets, \
    last_notification_sent_at, created_at, updated_at";

/// Provides CRUD and reminder-tracking operations for lease deadlines.
pub struct DeadlineRepo;

impl DeadlineRepo {
    /// Attach a deadline to a case. Offsets default to 7/1/0 days before.
    pub async fn create(
        pool: &PgPool,
        case_id: DbId,
        input: &CreateDeadline,
    ) -> Result<LeaseDeadline, sqlx::Error> {
        let offsets = input
            .notify_offsets
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTIFY_OFFSETS.to_vec());

        let query = format!(
            "INSERT INTO lease_deadlines (case_id, label, due_on, notify_offsets) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {DEADLINE_COLUMNS}"
        );
        sqlx::query_as::<_, LeaseDeadline>(&query)
            .bind(case_id)
            .bind(&input.label)
            .bind(input.due_on)
            .bind(&offsets)
            .fetch_one(pool)
            .await
    }

    /// All deadlines for a case, soonest first.
    pub async fn list_for_case(
        pool: &PgPool,
        case_id: DbId,
    ) -> Result<Vec<LeaseDeadline>, sqlx::Error> {
        let query = format!(
            "SELECT {DEADLINE_COLUMNS} FROM lease_deadlines \
             WHERE case_id = $1 ORDER BY due_on"
        );
        sqlx::query_as::<_, LeaseDeadline>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a deadline by ID. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lease_deadlines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deadlines due for a reminder today, joined with case and owner data.
    ///
    /// Matches `today` against each row's own offsets in SQL (`date - date`
    /// is whole days in Postgres), skips rows already notified today, and
    /// only considers paid, active cases: unpaid preview records never
    /// receive deadline reminders even when a deadline is configured.
    pub async fn list_due_today(
        pool: &PgPool,
        today: NaiveDate,
    ) -> Result<Vec<DeadlineWithCase>, sqlx::Error> {
        let query = format!(
            "SELECT d.{}, c.title AS case_title, u.email AS owner_email \
             FROM lease_deadlines d \
             JOIN cases c ON c.id = d.case_id \
             JOIN users u ON u.id = c.owner_id \
             WHERE c.deletion_status = 'active' \
               AND c.purchase_type IS NOT NULL \
               AND d.due_on >= $1 \
               AND (d.due_on - $1) = ANY(d.notify_offsets) \
               AND (d.last_notification_sent_at IS NULL \
                    OR d.last_notification_sent_at::date < $1) \
             ORDER BY d.due_on",
            DEADLINE_COLUMNS.replace(", ", ", d.")
        );
        sqlx::query_as::<_, DeadlineWithCase>(&query)
            .bind(today)
            .fetch_all(pool)
            .await
    }

    /// Record a sent reminder, gated to one send per calendar day.
    pub async fn mark_notified(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE lease_deadlines SET \
                last_notification_sent_at = $2, \
                updated_at = $2 \
             WHERE id = $1 \
               AND (last_notification_sent_at IS NULL \
                    OR last_notification_sent_at::date < $2::date)",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
