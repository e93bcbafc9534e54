//! Case entity models and DTOs.
//!
//! A case is one tenancy or booking a user tracks. Its lifecycle fields
//! (`retention_until`, `deletion_status`, `grace_until`, the reminder level
//! and one-shot flags) are written only by purchase ingestion and the
//! transition scanner.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leasevault_core::entitlements::CaseFacts;
use leasevault_core::error::CoreError;
use leasevault_core::stay::StayType;
use leasevault_core::types::{DbId, Timestamp};

/// `deletion_status` value for normally stored cases.
pub const STATUS_ACTIVE: &str = "active";

/// `deletion_status` value while the grace period runs.
pub const STATUS_PENDING_DELETION: &str = "pending_deletion";

/// A row from the `cases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Case {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub stay_type: String,
    /// First completion timestamp; arrival for short stays. Set once.
    pub checkin_completed_at: Option<Timestamp>,
    /// Second completion timestamp; departure for short stays. Set once.
    pub handover_completed_at: Option<Timestamp>,
    /// `None` until the first qualifying purchase protects the case.
    pub retention_until: Option<Timestamp>,
    pub storage_years_purchased: i32,
    pub deletion_status: String,
    /// Set if and only if `deletion_status = pending_deletion`.
    pub grace_until: Option<Timestamp>,
    pub retention_reminder_level: i16,
    pub expiry_notified_at: Option<Timestamp>,
    pub final_expiry_notified_at: Option<Timestamp>,
    /// Most recent evidence pack applied, if any.
    pub purchase_type: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Case {
    /// Typed stay type, failing on a value outside the CHECK constraint.
    pub fn stay_type(&self) -> Result<StayType, CoreError> {
        StayType::parse(&self.stay_type).ok_or_else(|| {
            CoreError::Internal(format!(
                "case {} has invalid stay_type '{}'",
                self.id, self.stay_type
            ))
        })
    }

    /// The subset of this row the entitlement resolver reads.
    pub fn facts(&self) -> Result<CaseFacts, CoreError> {
        Ok(CaseFacts {
            stay_type: self.stay_type()?,
            checkin_completed_at: self.checkin_completed_at,
            handover_completed_at: self.handover_completed_at,
            retention_until: self.retention_until,
        })
    }

    /// Whether the grace period is currently running.
    pub fn is_pending_deletion(&self) -> bool {
        self.deletion_status == STATUS_PENDING_DELETION
    }
}

/// DTO for creating a new case. Created `active` with no retention.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCase {
    pub owner_id: DbId,
    pub title: String,
    pub stay_type: StayType,
}

/// A case joined with its owner's email, used by the scanner so reminder
/// sends need no per-case owner lookup.
#[derive(Debug, Clone, FromRow)]
pub struct CaseWithOwner {
    #[sqlx(flatten)]
    pub case: Case,
    pub owner_email: String,
}

/// The case-row effects of one applied purchase.
///
/// Built by purchase ingestion from the pack rules and applied inside the
/// same transaction as the ledger insert.
#[derive(Debug, Clone)]
pub struct PurchaseEffects {
    /// New retention deadline; `None` leaves the column untouched.
    pub retention_until: Option<Timestamp>,
    /// New most-recent evidence pack; `None` leaves the column untouched.
    pub purchase_type: Option<String>,
    /// Extension years to add to `storage_years_purchased`.
    pub add_storage_years: i32,
    /// Reset the reminder level and clear both one-shot notified flags,
    /// re-arming the cadence for a new retention term.
    pub reset_reminders: bool,
    /// Leave `pending_deletion`, clearing `grace_until`.
    pub reactivate: bool,
}
