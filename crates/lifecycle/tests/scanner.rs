//! Integration tests for the transition scanner.
//!
//! Drives `scan_once` with explicit clocks against a real database:
//! - Reminder escalation fires each level exactly once
//! - Same-day re-runs are no-ops
//! - Email failure leaves the level untouched for retry
//! - Expiry and grace transitions are one-way
//! - Purge removes storage objects, writes the audit entry, deletes the row
//! - Storage failure never blocks the purge
//! - The deadline track gates by payment state and calendar day
//! - The full end-to-end lifecycle walk

mod common;

use chrono::{Duration, Months, Utc};
use sqlx::PgPool;

use common::*;
use leasevault_core::packs::PackType;
use leasevault_core::stay::StayType;
use leasevault_core::types::{DbId, Timestamp};
use leasevault_db::models::asset::CreateAsset;
use leasevault_db::models::deadline::CreateDeadline;
use leasevault_db::repositories::{AssetRepo, AuditRepo, CaseRepo, DeadlineRepo};
use leasevault_lifecycle::apply_purchase;

/// Protect a case with a checkin pack purchased at `purchased_at` and return
/// the resulting retention deadline.
async fn protect(pool: &PgPool, h: &Harness, case_id: DbId, purchased_at: Timestamp) -> Timestamp {
    apply_purchase(
        pool,
        h.mailer.as_ref(),
        &evidence_event(case_id, PackType::Checkin, &format!("pay_{case_id}")),
        purchased_at,
    )
    .await
    .unwrap();
    CaseRepo::find_by_id(pool, case_id)
        .await
        .unwrap()
        .unwrap()
        .retention_until
        .unwrap()
}

// ---------------------------------------------------------------------------
// Reminder escalation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn five_days_out_sends_exactly_one_final_reminder(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(12)).await;

    let scan_at = retention - Duration::days(5);
    let report = h.scanner.scan_once(scan_at).await.unwrap();
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.failures, 0);

    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.retention_reminder_level, 3);
    assert_eq!(
        h.mailer.sent_templates(),
        vec!["retention-reminder-final-long-term"]
    );

    // Same clock, second run: nothing more goes out.
    let report = h.scanner.scan_once(scan_at).await.unwrap();
    assert_eq!(report.reminders_sent, 0);
    assert_eq!(h.mailer.sent_count(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn levels_escalate_through_the_windows(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(11)).await;

    let level_at = |case: &leasevault_db::models::case::Case| case.retention_reminder_level;

    // 45 days out: level 1.
    h.scanner.scan_once(retention - Duration::days(45)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(level_at(&case), 1);
    assert!(case.expiry_notified_at.is_none());

    // 20 days out: level 2, expiry flag stamps.
    h.scanner.scan_once(retention - Duration::days(20)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(level_at(&case), 2);
    assert!(case.expiry_notified_at.is_some());

    // 3 days out: level 3, final flag stamps.
    h.scanner.scan_once(retention - Duration::days(3)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(level_at(&case), 3);
    assert!(case.final_expiry_notified_at.is_some());

    assert_eq!(
        h.mailer.sent_templates(),
        vec![
            "retention-reminder-60",
            "retention-reminder-30-long-term",
            "retention-reminder-final-long-term",
        ]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn skipped_windows_collapse_into_one_send(pool: PgPool) {
    // A scanner that was down for weeks must not backfill three reminders;
    // it jumps straight to the current target level with a single email.
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(12)).await;

    h.scanner.scan_once(retention - Duration::days(2)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.retention_reminder_level, 3);
    assert_eq!(h.mailer.sent_count(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn email_failure_leaves_level_for_retry(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(12)).await;

    h.mailer.set_failing(true);
    let scan_at = retention - Duration::days(5);
    let report = h.scanner.scan_once(scan_at).await.unwrap();
    assert_eq!(report.reminders_sent, 0);
    assert_eq!(report.failures, 1);

    // The level is the delivery acknowledgment; it must not have moved.
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.retention_reminder_level, 0);

    // Next scan, transport recovered: the reminder goes out.
    h.mailer.set_failing(false);
    let report = h.scanner.scan_once(scan_at + Duration::hours(1)).await.unwrap();
    assert_eq!(report.reminders_sent, 1);
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.retention_reminder_level, 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn short_stay_reminders_use_the_window_language(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::ShortStay).await;

    apply_purchase(
        &pool,
        h.mailer.as_ref(),
        &evidence_event(case_id, PackType::ShortStay, "pay_1"),
        Utc::now() - Duration::days(10),
    )
    .await
    .unwrap();
    let retention = CaseRepo::find_by_id(&pool, case_id)
        .await
        .unwrap()
        .unwrap()
        .retention_until
        .unwrap();

    h.scanner.scan_once(retention - Duration::days(10)).await.unwrap();
    assert_eq!(
        h.mailer.sent_templates(),
        vec!["retention-reminder-30-short-stay"]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unprotected_cases_are_exempt(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    new_case(&pool, owner, StayType::LongTerm).await;

    let report = h.scanner.scan_once(Utc::now()).await.unwrap();
    assert_eq!(report.reminders_sent, 0);
    assert_eq!(report.cases_marked_pending, 0);
    assert_eq!(h.mailer.sent_count(), 0);
}

// ---------------------------------------------------------------------------
// Expiry and purge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn lapsed_retention_starts_the_grace_period(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(13)).await;

    let scan_at = retention + Duration::days(1);
    let report = h.scanner.scan_once(scan_at).await.unwrap();
    assert_eq!(report.cases_marked_pending, 1);

    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.deletion_status, "pending_deletion");
    assert_eq!(case.grace_until, Some(scan_at + Duration::days(30)));

    // One-way: a second scan does not restart the grace period.
    let report = h.scanner.scan_once(scan_at + Duration::hours(2)).await.unwrap();
    assert_eq!(report.cases_marked_pending, 0);
    let unchanged = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(unchanged.grace_until, case.grace_until);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn grace_expiry_purges_record_and_storage(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(14)).await;

    for path in ["case/1/checkin.jpg", "case/1/handover.mp4"] {
        AssetRepo::create(
            &pool,
            case_id,
            &CreateAsset {
                phase: None,
                kind: "photo".to_string(),
                storage_path: path.to_string(),
                file_size_bytes: Some(1024),
            },
        )
        .await
        .unwrap();
    }

    let expired_at = retention + Duration::days(1);
    h.scanner.scan_once(expired_at).await.unwrap();

    // One hour past the grace deadline.
    let purge_at = expired_at + Duration::days(30) + Duration::hours(1);
    let report = h.scanner.scan_once(purge_at).await.unwrap();
    assert_eq!(report.cases_purged, 1);

    assert!(CaseRepo::find_by_id(&pool, case_id).await.unwrap().is_none());
    let mut deleted = h.storage.deleted_paths();
    deleted.sort();
    assert_eq!(deleted, vec!["case/1/checkin.jpg", "case/1/handover.mp4"]);

    // The audit entry outlives the case.
    let audit = AuditRepo::list_for_case(&pool, case_id).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action_type, "purge");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn storage_failure_never_blocks_the_purge(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(14)).await;

    AssetRepo::create(
        &pool,
        case_id,
        &CreateAsset {
            phase: None,
            kind: "photo".to_string(),
            storage_path: "case/1/orphan.jpg".to_string(),
            file_size_bytes: Some(1024),
        },
    )
    .await
    .unwrap();

    let expired_at = retention + Duration::days(1);
    h.scanner.scan_once(expired_at).await.unwrap();

    h.storage.set_failing(true);
    let purge_at = expired_at + Duration::days(31);
    let report = h.scanner.scan_once(purge_at).await.unwrap();

    // Best-effort cleanup: the orphan is logged, the record purge proceeds.
    assert_eq!(report.cases_purged, 1);
    assert!(CaseRepo::find_by_id(&pool, case_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn purchase_between_list_and_purge_is_respected(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(14)).await;

    let expired_at = retention + Duration::days(1);
    h.scanner.scan_once(expired_at).await.unwrap();

    // Recovery purchase lands before the purge scan.
    apply_purchase(
        &pool,
        h.mailer.as_ref(),
        &extension_event(case_id, 1, "pay_rescue"),
        expired_at + Duration::days(29),
    )
    .await
    .unwrap();

    let report = h.scanner.scan_once(expired_at + Duration::days(31)).await.unwrap();
    assert_eq!(report.cases_purged, 0);
    assert!(CaseRepo::find_by_id(&pool, case_id).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Storage-extension re-arm
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn extension_rearms_the_thirty_day_reminder(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let retention = protect(&pool, &h, case_id, Utc::now() - Months::new(11)).await;

    // Ride the ladder to level 2; the expiry flag stamps.
    h.scanner.scan_once(retention - Duration::days(20)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert!(case.expiry_notified_at.is_some());

    // Buy a year. Flags clear, level resets.
    apply_purchase(
        &pool,
        h.mailer.as_ref(),
        &extension_event(case_id, 1, "pay_ext"),
        retention - Duration::days(19),
    )
    .await
    .unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert!(case.expiry_notified_at.is_none());
    assert_eq!(case.retention_reminder_level, 0);
    let new_retention = case.retention_until.unwrap();
    assert_eq!(new_retention, retention + Months::new(12));

    // Entering the new 30-day window sends a fresh reminder.
    h.mailer.sent.lock().unwrap().clear();
    h.scanner.scan_once(new_retention - Duration::days(25)).await.unwrap();
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.retention_reminder_level, 2);
    assert!(case.expiry_notified_at.is_some());
    assert_eq!(
        h.mailer.sent_templates(),
        vec!["retention-reminder-30-long-term"]
    );
}

// ---------------------------------------------------------------------------
// Deadline track
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn deadline_reminders_fire_once_per_day_for_paid_cases(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let now = Utc::now();

    DeadlineRepo::create(
        &pool,
        case_id,
        &CreateDeadline {
            label: "Give notice".to_string(),
            due_on: now.date_naive() + Duration::days(7),
            notify_offsets: None,
        },
    )
    .await
    .unwrap();

    // Unpaid preview case: deadline configured, nothing sends.
    let report = h.scanner.scan_once(now).await.unwrap();
    assert_eq!(report.deadline_reminders_sent, 0);

    protect(&pool, &h, case_id, now).await;

    let report = h.scanner.scan_once(now).await.unwrap();
    assert_eq!(report.deadline_reminders_sent, 1);
    assert_eq!(h.mailer.sent_templates(), vec!["deadline-reminder"]);

    // Re-run the same day: gated off.
    let report = h.scanner.scan_once(now + Duration::hours(3)).await.unwrap();
    assert_eq!(report.deadline_reminders_sent, 0);
    assert_eq!(h.mailer.sent_count(), 1);
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_lifecycle_walk(pool: PgPool) {
    let h = harness(&pool);
    let owner = new_owner(&pool, "a@example.com").await;
    let case_id = new_case(&pool, owner, StayType::LongTerm).await;
    let t0 = Utc::now() - Months::new(13);

    // Created: active, unprotected, invisible to the scanner.
    let report = h.scanner.scan_once(t0).await.unwrap();
    assert_eq!(report.reminders_sent + report.cases_marked_pending, 0);

    // Checkin purchase protects for 12 months.
    let retention = protect(&pool, &h, case_id, t0).await;
    assert_eq!(retention, t0 + Months::new(12));

    AssetRepo::create(
        &pool,
        case_id,
        &CreateAsset {
            phase: Some("checkin".to_string()),
            kind: "photo".to_string(),
            storage_path: "case/e2e/checkin-01.jpg".to_string(),
            file_size_bytes: Some(2048),
        },
    )
    .await
    .unwrap();

    // Quiet until 60 days out.
    let report = h.scanner.scan_once(retention - Duration::days(90)).await.unwrap();
    assert_eq!(report.reminders_sent, 0);

    // The ladder: 1 at 60 days, 2 at 30, 3 in the final week.
    for (scan_at, expected_level) in [
        (retention - Duration::days(59), 1),
        (retention - Duration::days(25), 2),
        (retention - Duration::days(6), 3),
    ] {
        let report = h.scanner.scan_once(scan_at).await.unwrap();
        assert_eq!(report.reminders_sent, 1);
        let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
        assert_eq!(case.retention_reminder_level, expected_level);
    }

    // Expiry passes: grace period starts.
    let expired_at = retention + Duration::hours(2);
    let report = h.scanner.scan_once(expired_at).await.unwrap();
    assert_eq!(report.cases_marked_pending, 1);
    let case = CaseRepo::find_by_id(&pool, case_id).await.unwrap().unwrap();
    assert_eq!(case.grace_until, Some(expired_at + Duration::days(30)));

    // Thirty days pass with no new purchase: purged, storage gone.
    let report = h
        .scanner
        .scan_once(expired_at + Duration::days(30) + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(report.cases_purged, 1);
    assert!(CaseRepo::find_by_id(&pool, case_id).await.unwrap().is_none());
    assert_eq!(h.storage.deleted_paths(), vec!["case/e2e/checkin-01.jpg"]);
    assert_eq!(h.mailer.sent_count(), 3);
}
