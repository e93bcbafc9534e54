//! Handler for the scheduled retention-scan trigger.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use leasevault_lifecycle::{RetentionScanner, ScanReport};

use crate::error::AppResult;
use crate::middleware::scan_auth::ScanAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/internal/retention/scan
///
/// Run one transition scan and return its report. Invoked on a fixed daily
/// schedule by the cron trigger; the [`ScanAuth`] extractor rejects
/// unauthenticated invocations before any record is touched. Safe to re-run:
/// every transition is guarded, so an overlapping invocation double-sends
/// and double-purges nothing.
pub async fn trigger_scan(
    _auth: ScanAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ScanReport>>> {
    let scanner = RetentionScanner::new(
        state.pool.clone(),
        state.mailer.clone(),
        state.storage.clone(),
    );
    let report = scanner.scan_once(Utc::now()).await?;

    tracing::info!(
        reminders = report.reminders_sent,
        marked_pending = report.cases_marked_pending,
        purged = report.cases_purged,
        deadline_reminders = report.deadline_reminders_sent,
        failures = report.failures,
        "Manual retention scan complete"
    );

    Ok(Json(DataResponse { data: report }))
}
