//! Handlers for the `/cases` resource.
//!
//! The case surface is kept thin: create/get/list, the entitlement
//! projection, phase sealing (gated by the resolver), and deliberate
//! self-service deletion, which removes the case immediately and never
//! enters the scanner's grace lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use leasevault_core::entitlements::{resolve, Entitlements, Phase};
use leasevault_core::error::CoreError;
use leasevault_core::stay::StayType;
use leasevault_core::types::DbId;
use leasevault_db::models::audit::{CreateAuditLog, ACTION_SELF_SERVICE_DELETE};
use leasevault_db::models::case::{Case, CreateCase};
use leasevault_db::repositories::{AssetRepo, AuditRepo, CaseRepo, PurchaseRepo, UserRepo};
use leasevault_storage::ObjectStorage;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /cases`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCaseRequest {
    pub owner_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub stay_type: StayType,
}

/// Query parameters for `GET /cases`.
#[derive(Debug, Deserialize)]
pub struct ListCasesQuery {
    pub owner_id: DbId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/cases
///
/// Create a case. Starts `active` with no retention protection.
pub async fn create_case(
    State(state): State<AppState>,
    Json(input): Json<CreateCaseRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    UserRepo::find_by_id(&state.pool, input.owner_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "user",
            id: input.owner_id,
        })?;

    let case = CaseRepo::create(
        &state.pool,
        &CreateCase {
            owner_id: input.owner_id,
            title: input.title,
            stay_type: input.stay_type,
        },
    )
    .await?;

    tracing::info!(case_id = case.id, stay_type = %case.stay_type, "Case created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: case })))
}

/// GET /api/v1/cases/{id}
pub async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Case>>> {
    let case = find_case(&state, id).await?;
    Ok(Json(DataResponse { data: case }))
}

/// GET /api/v1/cases?owner_id=
pub async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<ListCasesQuery>,
) -> AppResult<Json<DataResponse<Vec<Case>>>> {
    let cases = CaseRepo::list_for_owner(&state.pool, query.owner_id).await?;
    Ok(Json(DataResponse { data: cases }))
}

/// GET /api/v1/cases/{id}/entitlements
///
/// The capability set this case currently grants, resolved from its
/// purchase ledger. Read-only; every other feature gates on these flags.
pub async fn get_entitlements(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Entitlements>>> {
    let case = find_case(&state, id).await?;
    let facts = case.facts()?;
    let packs = PurchaseRepo::pack_types_for_case(&state.pool, case.id).await?;

    let entitlements = resolve(&facts, &packs, Utc::now());
    Ok(Json(DataResponse { data: entitlements }))
}

/// POST /api/v1/cases/{id}/seal/{phase}
///
/// Seal an evidence phase. Gated by the resolver (the phase's pack must be
/// owned for this stay shape); sealing is permanent, so a second attempt
/// conflicts instead of moving the timestamp.
pub async fn seal_phase(
    State(state): State<AppState>,
    Path((id, phase)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<Case>>> {
    let phase = parse_phase(&phase)?;

    let case = find_case(&state, id).await?;
    let facts = case.facts()?;
    let packs = PurchaseRepo::pack_types_for_case(&state.pool, case.id).await?;

    let entitlements = resolve(&facts, &packs, Utc::now());
    if !entitlements.can_seal(phase) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Sealing this phase requires its evidence pack".into(),
        )));
    }

    let sealed = CaseRepo::seal_phase(&state.pool, case.id, phase, Utc::now())
        .await?
        .ok_or_else(|| CoreError::Conflict("Phase is already sealed".into()))?;

    tracing::info!(case_id = sealed.id, phase = ?phase, "Phase sealed");

    Ok(Json(DataResponse { data: sealed }))
}

/// DELETE /api/v1/cases/{id}
///
/// Deliberate self-service deletion: remove the storage objects best-effort,
/// write the audit entry, delete the row. Immediate; no grace period.
pub async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = find_case(&state, id).await?;

    let paths = AssetRepo::storage_paths_for_case(&state.pool, case.id).await?;
    if !paths.is_empty() {
        match state.storage.delete_objects(&paths).await {
            Ok(outcome) if outcome.failed.is_empty() => {}
            Ok(outcome) => {
                tracing::warn!(
                    case_id = case.id,
                    orphaned = outcome.failed.len(),
                    "Self-service deletion left storage orphans"
                );
            }
            Err(e) => {
                tracing::error!(
                    case_id = case.id,
                    error = %e,
                    "Storage delete failed during self-service deletion; proceeding"
                );
            }
        }
    }

    let audit = CreateAuditLog {
        action_type: ACTION_SELF_SERVICE_DELETE.to_string(),
        case_id: Some(case.id),
        details_json: Some(serde_json::json!({
            "owner_id": case.owner_id,
            "asset_count": paths.len(),
        })),
    };
    if let Err(e) = AuditRepo::insert(&state.pool, &audit).await {
        tracing::error!(case_id = case.id, error = %e, "Deletion audit entry failed");
    }

    CaseRepo::delete(&state.pool, case.id).await?;
    tracing::info!(case_id = case.id, "Case deleted by owner");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a case or fail with 404.
pub(crate) async fn find_case(state: &AppState, id: DbId) -> Result<Case, AppError> {
    Ok(CaseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "case", id })?)
}

fn parse_phase(s: &str) -> Result<Phase, AppError> {
    match s {
        "checkin" => Ok(Phase::Checkin),
        "handover" => Ok(Phase::Handover),
        other => Err(AppError::BadRequest(format!(
            "Unknown phase '{other}'. Expected 'checkin' or 'handover'"
        ))),
    }
}
