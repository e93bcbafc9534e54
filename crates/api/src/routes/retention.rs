//! Route definitions for the internal retention endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::retention;
use crate::state::AppState;

/// Routes mounted at `/internal`.
///
/// ```text
/// POST /retention/scan    -> run one transition scan (bearer token)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/retention/scan", post(retention::trigger_scan))
}
