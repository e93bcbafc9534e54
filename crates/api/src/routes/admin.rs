//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET /vault-stats    -> aggregate counts, served through the TTL cache
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/vault-stats", get(admin::vault_stats))
}
