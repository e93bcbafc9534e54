pub mod admin;
pub mod cases;
pub mod health;
pub mod retention;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /cases                                   create, list per owner
/// /cases/{id}                              get, delete (immediate self-service)
/// /cases/{id}/entitlements                 capability projection + upsell list
/// /cases/{id}/seal/{phase}                 seal a phase (POST)
/// /cases/{id}/assets                       register, list (with signed URLs)
/// /cases/{id}/deadlines                    create, list
///
/// /webhooks/payment                        payment-completed event (HMAC-signed)
///
/// /internal/retention/scan                 run one transition scan (bearer token)
///
/// /admin/vault-stats                       cached aggregate counts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/cases", cases::router())
        .nest("/webhooks", webhooks::router())
        .nest("/internal", retention::router())
        .nest("/admin", admin::router())
}
