//! Handlers for case assets.
//!
//! Upload forwarding lives with the object storage provider; this surface
//! registers the resulting storage path against a case and lists assets with
//! time-limited download URLs.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use leasevault_core::error::CoreError;
use leasevault_core::types::DbId;
use leasevault_db::models::asset::{Asset, CreateAsset};
use leasevault_db::repositories::AssetRepo;
use leasevault_storage::ObjectStorage;

use crate::error::{AppError, AppResult};
use crate::handlers::cases::find_case;
use crate::response::DataResponse;
use crate::state::AppState;

/// How long a signed download URL stays valid.
const SIGNED_URL_TTL: Duration = Duration::from_secs(900);

/// Accepted `kind` values, matching the table's CHECK constraint.
const ASSET_KINDS: [&str; 3] = ["photo", "video", "document"];

/// Accepted `phase` values, matching the table's CHECK constraint.
const ASSET_PHASES: [&str; 2] = ["checkin", "handover"];

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

/// Request body for `POST /cases/{id}/assets`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAssetRequest {
    pub phase: Option<String>,
    pub kind: String,
    #[validate(length(min = 1, max = 1024))]
    pub storage_path: String,
    pub file_size_bytes: Option<i64>,
}

/// An asset joined with its signed download URL.
#[derive(Debug, Serialize)]
pub struct AssetWithUrl {
    #[serde(flatten)]
    pub asset: Asset,
    /// Time-limited download URL; absent when presigning failed.
    pub download_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/cases/{id}/assets
///
/// Register an uploaded file against a case.
pub async fn register_asset(
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<RegisterAssetRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    if !ASSET_KINDS.contains(&input.kind.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown asset kind '{}'. Expected one of: {}",
            input.kind,
            ASSET_KINDS.join(", ")
        )));
    }
    if let Some(phase) = &input.phase {
        if !ASSET_PHASES.contains(&phase.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown phase '{phase}'. Expected 'checkin' or 'handover'"
            )));
        }
    }
    if input.file_size_bytes.is_some_and(|size| size < 0) {
        return Err(AppError::BadRequest(
            "file_size_bytes must not be negative".into(),
        ));
    }

    let case = find_case(&state, case_id).await?;

    let asset = AssetRepo::create(
        &state.pool,
        case.id,
        &CreateAsset {
            phase: input.phase,
            kind: input.kind,
            storage_path: input.storage_path,
            file_size_bytes: input.file_size_bytes,
        },
    )
    .await?;

    tracing::info!(case_id = case.id, asset_id = asset.id, kind = %asset.kind, "Asset registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// GET /api/v1/cases/{id}/assets
///
/// List a case's assets, each with a signed download URL. A presigning
/// failure is logged per asset and leaves the URL absent rather than failing
/// the listing.
pub async fn list_assets(
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AssetWithUrl>>>> {
    let case = find_case(&state, case_id).await?;
    let assets = AssetRepo::list_for_case(&state.pool, case.id).await?;

    let mut items = Vec::with_capacity(assets.len());
    for asset in assets {
        let download_url = match state
            .storage
            .signed_url(&asset.storage_path, SIGNED_URL_TTL)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(asset_id = asset.id, error = %e, "Presigning failed");
                None
            }
        };
        items.push(AssetWithUrl {
            asset,
            download_url,
        });
    }

    Ok(Json(DataResponse { data: items }))
}
