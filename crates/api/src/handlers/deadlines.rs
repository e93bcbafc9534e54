//! Handlers for lease deadlines.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use leasevault_core::error::CoreError;
use leasevault_core::types::DbId;
use leasevault_db::models::deadline::{CreateDeadline, LeaseDeadline};
use leasevault_db::repositories::DeadlineRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::cases::find_case;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /cases/{id}/deadlines`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeadlineRequest {
    #[validate(length(min = 1, max = 200))]
    pub label: String,
    pub due_on: NaiveDate,
    /// Days-before offsets; defaults to `[7, 1, 0]` when omitted.
    pub notify_offsets: Option<Vec<i32>>,
}

/// POST /api/v1/cases/{id}/deadlines
///
/// Attach a deadline date to a case. Reminders only ever fire while the case
/// is in a paid state; attaching a deadline to an unpaid case is allowed but
/// stays silent until a pack is purchased.
pub async fn create_deadline(
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<CreateDeadlineRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    if let Some(offsets) = &input.notify_offsets {
        if offsets.is_empty() {
            return Err(AppError::BadRequest(
                "notify_offsets must not be empty".into(),
            ));
        }
        if offsets.iter().any(|&offset| offset < 0) {
            return Err(AppError::BadRequest(
                "notify_offsets must not be negative".into(),
            ));
        }
    }

    let case = find_case(&state, case_id).await?;

    let deadline = DeadlineRepo::create(
        &state.pool,
        case.id,
        &CreateDeadline {
            label: input.label,
            due_on: input.due_on,
            notify_offsets: input.notify_offsets,
        },
    )
    .await?;

    tracing::info!(
        case_id = case.id,
        deadline_id = deadline.id,
        due_on = %deadline.due_on,
        "Deadline attached"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: deadline })))
}

/// GET /api/v1/cases/{id}/deadlines
pub async fn list_deadlines(
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<LeaseDeadline>>>> {
    let case = find_case(&state, case_id).await?;
    let deadlines = DeadlineRepo::list_for_case(&state.pool, case.id).await?;
    Ok(Json(DataResponse { data: deadlines }))
}
