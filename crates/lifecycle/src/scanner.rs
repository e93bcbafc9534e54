//! The transition scanner.
//!
//! A daily batch that evaluates every protected case against the clock and
//! drives reminder escalation, the expiry transition, final purge, and the
//! independent lease-deadline reminder track. Each record is processed
//! inside its own error boundary; one failure never aborts the batch, and
//! every transition is guarded at the UPDATE so an overlapping run
//! double-sends and double-purges nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use leasevault_core::deadlines::{matched_offset, sent_today};
use leasevault_core::retention::{grace_deadline, target_reminder_level};
use leasevault_core::types::Timestamp;
use leasevault_db::models::audit::{CreateAuditLog, ACTION_PURGE};
use leasevault_db::models::case::{Case, CaseWithOwner};
use leasevault_db::models::deadline::DeadlineWithCase;
use leasevault_db::repositories::{AssetRepo, AuditRepo, CaseRepo, DeadlineRepo};
use leasevault_db::DbPool;
use leasevault_notify::{templates, Mailer};
use leasevault_storage::ObjectStorage;

use crate::error::LifecycleError;

/// Default scan cadence: once per day.
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 86_400;

/// Counters for one scan run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanReport {
    pub reminders_sent: u32,
    pub cases_marked_pending: u32,
    pub cases_purged: u32,
    pub deadline_reminders_sent: u32,
    /// Records whose processing failed this run; retried on the next scan.
    pub failures: u32,
}

// ---------------------------------------------------------------------------
// RetentionScanner
// ---------------------------------------------------------------------------

/// Background service driving the retention state machine.
pub struct RetentionScanner {
    pool: DbPool,
    mailer: Arc<dyn Mailer>,
    storage: Arc<dyn ObjectStorage>,
}

impl RetentionScanner {
    /// Create a new scanner over the given pool and collaborators.
    pub fn new(pool: DbPool, mailer: Arc<dyn Mailer>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            pool,
            mailer,
            storage,
        }
    }

    /// Run the scan loop until `cancel` is triggered.
    ///
    /// The cadence defaults to daily and can be overridden via
    /// `SCAN_INTERVAL_SECS` (useful in development).
    pub async fn run(&self, cancel: CancellationToken) {
        let interval_secs: u64 = std::env::var("SCAN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS);

        tracing::info!(interval_secs, "Retention scanner started");

        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Retention scanner stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.scan_once(Utc::now()).await {
                        Ok(report) => {
                            tracing::info!(
                                reminders = report.reminders_sent,
                                marked_pending = report.cases_marked_pending,
                                purged = report.cases_purged,
                                deadline_reminders = report.deadline_reminders_sent,
                                failures = report.failures,
                                "Retention scan complete"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Retention scan failed");
                        }
                    }
                }
            }
        }
    }

    /// Evaluate every case against `now` and apply due transitions.
    ///
    /// Errors out only when a candidate list cannot be read at all;
    /// per-record failures are counted in the report and retried on the
    /// next run.
    pub async fn scan_once(&self, now: Timestamp) -> Result<ScanReport, LifecycleError> {
        let mut report = ScanReport::default();
        self.escalate_reminders(now, &mut report).await?;
        self.expire_cases(now, &mut report).await?;
        self.purge_cases(now, &mut report).await?;
        self.remind_deadlines(now, &mut report).await?;
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Pass 1: reminder escalation
    // -----------------------------------------------------------------------

    async fn escalate_reminders(
        &self,
        now: Timestamp,
        report: &mut ScanReport,
    ) -> Result<(), LifecycleError> {
        let candidates = CaseRepo::list_reminder_candidates(&self.pool, now).await?;

        for candidate in &candidates {
            match self.process_reminder(candidate, now).await {
                Ok(true) => report.reminders_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        case_id = candidate.case.id,
                        error = %e,
                        "Reminder escalation failed; will retry next scan"
                    );
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Send at most one reminder for a case and advance its stored level.
    ///
    /// The level only moves after a successful send: it is the at-least-once
    /// delivery acknowledgment, so a failed send leaves it untouched and the
    /// next scan retries.
    async fn process_reminder(
        &self,
        candidate: &CaseWithOwner,
        now: Timestamp,
    ) -> Result<bool, LifecycleError> {
        let case = &candidate.case;
        let Some(retention_until) = case.retention_until else {
            return Ok(false);
        };

        let target = target_reminder_level(retention_until, now);
        if target <= case.retention_reminder_level {
            return Ok(false);
        }

        let stay = case.stay_type()?;
        let email = templates::retention_reminder(stay, target, &case.title, retention_until);
        self.mailer.send(&candidate.owner_email, &email).await?;

        let advanced = CaseRepo::record_reminder_sent(&self.pool, case.id, target, now).await?;
        if advanced {
            tracing::info!(
                case_id = case.id,
                level = target,
                template = email.template_id,
                "Retention reminder sent"
            );
        }
        Ok(advanced)
    }

    // -----------------------------------------------------------------------
    // Pass 2: expiry
    // -----------------------------------------------------------------------

    async fn expire_cases(
        &self,
        now: Timestamp,
        report: &mut ScanReport,
    ) -> Result<(), LifecycleError> {
        let expired = CaseRepo::list_expired(&self.pool, now).await?;

        for case in &expired {
            match CaseRepo::mark_pending_deletion(&self.pool, case.id, grace_deadline(now), now)
                .await
            {
                Ok(true) => {
                    tracing::info!(case_id = case.id, "Case expired; grace period started");
                    report.cases_marked_pending += 1;
                }
                // Revived (or already transitioned) between list and update.
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(case_id = case.id, error = %e, "Expiry transition failed");
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pass 3: purge
    // -----------------------------------------------------------------------

    async fn purge_cases(
        &self,
        now: Timestamp,
        report: &mut ScanReport,
    ) -> Result<(), LifecycleError> {
        let due = CaseRepo::list_grace_expired(&self.pool, now).await?;

        for case in &due {
            match self.purge_case(case, now).await {
                Ok(true) => report.cases_purged += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(case_id = case.id, error = %e, "Purge failed; will retry next scan");
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    /// Purge one case: remove its storage objects, write the audit entry,
    /// delete the row.
    ///
    /// Storage removal is best-effort; orphaned objects are an accepted,
    /// logged risk and never block the purge. The audit entry is likewise
    /// non-blocking.
    async fn purge_case(&self, case: &Case, now: Timestamp) -> Result<bool, LifecycleError> {
        let paths = AssetRepo::storage_paths_for_case(&self.pool, case.id).await?;

        if !paths.is_empty() {
            match self.storage.delete_objects(&paths).await {
                Ok(outcome) if outcome.failed.is_empty() => {
                    tracing::info!(
                        case_id = case.id,
                        deleted = outcome.deleted,
                        "Purge removed storage objects"
                    );
                }
                Ok(outcome) => {
                    tracing::warn!(
                        case_id = case.id,
                        deleted = outcome.deleted,
                        orphaned = outcome.failed.len(),
                        "Purge left storage orphans"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        case_id = case.id,
                        error = %e,
                        "Storage delete failed during purge; proceeding with record deletion"
                    );
                }
            }
        }

        let audit = CreateAuditLog {
            action_type: ACTION_PURGE.to_string(),
            case_id: Some(case.id),
            details_json: Some(serde_json::json!({
                "reason": "grace_period_elapsed",
                "grace_until": case.grace_until,
                "purged_at": now,
                "asset_count": paths.len(),
            })),
        };
        if let Err(e) = AuditRepo::insert(&self.pool, &audit).await {
            tracing::error!(case_id = case.id, error = %e, "Purge audit entry failed");
        }

        let deleted = CaseRepo::delete_purged(&self.pool, case.id, now).await?;
        if deleted {
            tracing::info!(case_id = case.id, "Case purged");
        }
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Pass 4: lease deadlines
    // -----------------------------------------------------------------------

    async fn remind_deadlines(
        &self,
        now: Timestamp,
        report: &mut ScanReport,
    ) -> Result<(), LifecycleError> {
        let due = DeadlineRepo::list_due_today(&self.pool, now.date_naive()).await?;

        for item in &due {
            match self.process_deadline(item, now).await {
                Ok(true) => report.deadline_reminders_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        deadline_id = item.deadline.id,
                        error = %e,
                        "Deadline reminder failed; will retry next scan"
                    );
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    async fn process_deadline(
        &self,
        item: &DeadlineWithCase,
        now: Timestamp,
    ) -> Result<bool, LifecycleError> {
        let deadline = &item.deadline;

        // The list query already filters; these pure checks stay
        // authoritative under clock skew between query and send.
        let Some(offset) = matched_offset(deadline.due_on, now.date_naive(), &deadline.notify_offsets)
        else {
            return Ok(false);
        };
        if sent_today(deadline.last_notification_sent_at, now) {
            return Ok(false);
        }

        let email =
            templates::deadline_reminder(&item.case_title, &deadline.label, deadline.due_on, offset);
        self.mailer.send(&item.owner_email, &email).await?;

        let marked = DeadlineRepo::mark_notified(&self.pool, deadline.id, now).await?;
        if marked {
            tracing::info!(
                deadline_id = deadline.id,
                case_id = deadline.case_id,
                offset,
                "Deadline reminder sent"
            );
        }
        Ok(marked)
    }
}
