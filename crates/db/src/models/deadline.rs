//! Lease deadline models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leasevault_core::types::{DbId, Timestamp};

/// A row from the `lease_deadlines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaseDeadline {
    pub id: DbId,
    pub case_id: DbId,
    pub label: String,
    pub due_on: NaiveDate,
    /// Days-before offsets at which to remind; `0` is the deadline day.
    pub notify_offsets: Vec<i32>,
    /// Last reminder send, compared at calendar-day granularity.
    pub last_notification_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for attaching a deadline to a case.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeadline {
    pub label: String,
    pub due_on: NaiveDate,
    /// Defaults to `[7, 1, 0]` when omitted.
    pub notify_offsets: Option<Vec<i32>>,
}

/// A deadline joined with the case title and owner email the reminder needs.
#[derive(Debug, Clone, FromRow)]
pub struct DeadlineWithCase {
    #[sqlx(flatten)]
    pub deadline: LeaseDeadline,
    pub case_title: String,
    pub owner_email: String,
}
