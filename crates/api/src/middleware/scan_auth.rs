//! Bearer-token extractor for the scheduled retention-scan trigger.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use leasevault_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the caller presented the shared scan token.
///
/// Use as an extractor parameter on the internal scan endpoint; extraction
/// runs before the handler body, so an unauthenticated invocation is rejected
/// before any record is touched:
///
/// ```ignore
/// async fn trigger_scan(_auth: ScanAuth, State(state): State<AppState>) -> AppResult<Json<()>> {
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScanAuth;

impl FromRequestParts<AppState> for ScanAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        if token != state.config.scan_token {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid scan token".into(),
            )));
        }

        Ok(ScanAuth)
    }
}
