//! Route definitions for the `/cases` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{assets, cases, deadlines};
use crate::state::AppState;

/// Routes mounted at `/cases`.
///
/// ```text
/// POST   /                       -> create case
/// GET    /                       -> list cases for an owner (?owner_id=)
/// GET    /{id}                   -> get case
/// DELETE /{id}                   -> delete case immediately
/// GET    /{id}/entitlements      -> resolve current capability set
/// POST   /{id}/seal/{phase}      -> seal an evidence phase
/// POST   /{id}/assets            -> register an uploaded file
/// GET    /{id}/assets            -> list assets with signed URLs
/// POST   /{id}/deadlines         -> attach a lease deadline
/// GET    /{id}/deadlines         -> list lease deadlines
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cases::create_case).get(cases::list_cases))
        .route("/{id}", get(cases::get_case).delete(cases::delete_case))
        .route("/{id}/entitlements", get(cases::get_entitlements))
        .route("/{id}/seal/{phase}", post(cases::seal_phase))
        .route(
            "/{id}/assets",
            post(assets::register_asset).get(assets::list_assets),
        )
        .route(
            "/{id}/deadlines",
            post(deadlines::create_deadline).get(deadlines::list_deadlines),
        )
}
