//! Route definitions for inbound webhooks.

use axum::routing::post;
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST /payment    -> payment-completed event (HMAC-signed raw body)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(payment::payment_completed))
}
