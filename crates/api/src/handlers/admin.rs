//! Handlers for the `/admin` resource.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use leasevault_core::types::Timestamp;
use leasevault_db::repositories::{CaseRepo, PurchaseRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Cache key for the vault stats aggregate.
const STATS_CACHE_KEY: &str = "vault-stats";

/// Aggregate counts over the whole vault.
#[derive(Debug, Clone, Serialize)]
pub struct VaultStats {
    pub active_cases: i64,
    pub pending_deletion_cases: i64,
    pub total_purchases: i64,
    pub revenue_cents: i64,
    pub computed_at: Timestamp,
}

/// GET /api/v1/admin/vault-stats
///
/// Aggregate counts, served through the per-instance TTL cache so a
/// dashboard polling this endpoint does not hit the aggregate queries on
/// every request.
pub async fn vault_stats(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<VaultStats>>> {
    if let Some(stats) = state.stats_cache.get(&STATS_CACHE_KEY) {
        return Ok(Json(DataResponse { data: stats }));
    }

    let (active_cases, pending_deletion_cases) = CaseRepo::count_by_status(&state.pool).await?;
    let (total_purchases, revenue_cents) = PurchaseRepo::totals(&state.pool).await?;

    let stats = VaultStats {
        active_cases,
        pending_deletion_cases,
        total_purchases,
        revenue_cents,
        computed_at: Utc::now(),
    };
    state.stats_cache.insert(STATS_CACHE_KEY, stats.clone());

    Ok(Json(DataResponse { data: stats }))
}
