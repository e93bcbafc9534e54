//! Handler for the payment-completed webhook.
//!
//! The signature is verified over the raw request body before anything is
//! parsed; a bad or missing signature is rejected with no side effects. The
//! payload is then converted into a tagged event, rejecting unknown shapes
//! at the boundary, and handed to purchase ingestion. A duplicate delivery
//! is a success-no-op, never an error.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use leasevault_core::error::CoreError;
use leasevault_core::signing::verify_signature;
use leasevault_db::models::purchase::Purchase;
use leasevault_lifecycle::{apply_purchase, LifecycleError, PaymentEvent, PaymentEventPayload, PurchaseOutcome};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 signature of the raw body.
const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Acknowledgment returned to the payment processor.
#[derive(Debug, Serialize)]
pub struct PaymentAck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<Purchase>,
}

/// POST /api/v1/webhooks/payment
///
/// Apply a payment-completed event. 201 on first application, 200 on a
/// duplicate delivery, 401 on a signature failure, 422 on a malformed or
/// mismatched payload.
pub async fn payment_completed(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Missing {SIGNATURE_HEADER} header"
            )))
        })?;

    if !verify_signature(&state.config.payment_webhook_secret, &body, signature) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let payload: PaymentEventPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::UnprocessableEntity(format!("Malformed payment event: {e}")))?;

    let event = PaymentEvent::try_from(payload).map_err(|e| match e {
        CoreError::Validation(msg) => AppError::UnprocessableEntity(msg),
        other => AppError::Core(other),
    })?;

    let outcome = apply_purchase(&state.pool, state.mailer.as_ref(), &event, Utc::now())
        .await
        .map_err(|e| match e {
            LifecycleError::Core(CoreError::Validation(msg)) => {
                AppError::UnprocessableEntity(msg)
            }
            other => other.into(),
        })?;

    match outcome {
        PurchaseOutcome::Applied(purchase) => {
            tracing::info!(
                case_id = purchase.case_id,
                pack_type = %purchase.pack_type,
                payment_ref = %purchase.payment_ref,
                "Purchase applied"
            );
            Ok((
                StatusCode::CREATED,
                Json(DataResponse {
                    data: PaymentAck {
                        status: "applied",
                        purchase: Some(purchase),
                    },
                }),
            ))
        }
        PurchaseOutcome::Duplicate => Ok((
            StatusCode::OK,
            Json(DataResponse {
                data: PaymentAck {
                    status: "duplicate",
                    purchase: None,
                },
            }),
        )),
    }
}
