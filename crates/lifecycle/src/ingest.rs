//! Purchase ingestion.
//!
//! Applies a validated payment event to a case: appends to the purchase
//! ledger and recomputes the retention fields, all inside one transaction so
//! a crash can never leave a purchase without its retention update.
//! Safe under at-least-once webhook delivery: duplicates short-circuit on
//! the pre-check and, under a genuine race, on the ledger's unique index.

use sqlx::PgPool;

use leasevault_core::error::CoreError;
use leasevault_core::packs::PackType;
use leasevault_core::retention::{extended_retention, initial_retention};
use leasevault_core::types::Timestamp;
use leasevault_db::models::case::{Case, PurchaseEffects};
use leasevault_db::models::purchase::{CreatePurchase, Purchase};
use leasevault_db::repositories::{CaseRepo, PurchaseRepo, UserRepo};
use leasevault_notify::{templates, Mailer};

use crate::error::LifecycleError;
use crate::event::PaymentEvent;

/// Result of applying a payment event.
#[derive(Debug)]
pub enum PurchaseOutcome {
    /// The purchase was recorded and the case's retention fields updated.
    Applied(Purchase),
    /// The event was already applied; nothing was written.
    Duplicate,
}

/// Apply a payment-completed event to its case.
///
/// Validation fails closed with no side effects; a duplicate delivery is a
/// success-no-op, never an error. A qualifying purchase on a case in its
/// deletion grace period reactivates it and clears the grace deadline. Seal
/// timestamps are never touched, so seals survive a full retention lapse and
/// recovery.
pub async fn apply_purchase(
    pool: &PgPool,
    mailer: &dyn Mailer,
    event: &PaymentEvent,
    now: Timestamp,
) -> Result<PurchaseOutcome, LifecycleError> {
    let case = CaseRepo::find_by_id(pool, event.case_id())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "case",
            id: event.case_id(),
        })?;
    let stay = case.stay_type()?;

    let (input, effects) = match event {
        PaymentEvent::EvidencePack {
            pack,
            payment_ref,
            amount_cents,
            currency,
            stay_type_hint,
            ..
        } => {
            if let Some(hint) = stay_type_hint {
                if *hint != stay {
                    return Err(CoreError::Validation(format!(
                        "stay_type_hint '{}' does not match case stay_type '{}'",
                        hint.as_str(),
                        stay.as_str()
                    ))
                    .into());
                }
            }
            if !pack.valid_for(stay) {
                return Err(CoreError::Validation(format!(
                    "pack '{}' is not valid for a '{}' case",
                    pack.as_str(),
                    stay.as_str()
                ))
                .into());
            }
            if PurchaseRepo::exists_for_case_pack(pool, case.id, *pack).await? {
                return Ok(PurchaseOutcome::Duplicate);
            }

            // Short-stay retention counts from departure when it is already
            // known; the second completion timestamp holds it.
            let retention_until = initial_retention(*pack, case.handover_completed_at, now);

            let input = CreatePurchase {
                case_id: case.id,
                owner_id: case.owner_id,
                pack_type: *pack,
                storage_years: None,
                amount_cents: *amount_cents,
                currency: currency.clone(),
                payment_ref: payment_ref.clone(),
            };
            let effects = PurchaseEffects {
                retention_until,
                purchase_type: Some(pack.as_str().to_string()),
                add_storage_years: 0,
                reset_reminders: retention_until.is_some(),
                reactivate: case.is_pending_deletion(),
            };
            (input, effects)
        }

        PaymentEvent::StorageExtension {
            years,
            payment_ref,
            amount_cents,
            currency,
            ..
        } => {
            let input = CreatePurchase {
                case_id: case.id,
                owner_id: case.owner_id,
                pack_type: PackType::StorageExtension,
                storage_years: Some(*years),
                amount_cents: *amount_cents,
                currency: currency.clone(),
                payment_ref: payment_ref.clone(),
            };
            // A fresh, later expiry gets its own reminder cadence: the level
            // resets and both one-shot notified flags clear.
            let effects = PurchaseEffects {
                retention_until: Some(extended_retention(case.retention_until, now, *years)),
                purchase_type: None,
                add_storage_years: *years,
                reset_reminders: true,
                reactivate: case.is_pending_deletion(),
            };
            (input, effects)
        }
    };

    let mut tx = pool.begin().await.map_err(LifecycleError::Database)?;

    let purchase = match PurchaseRepo::insert(&mut tx, &input).await {
        Ok(purchase) => purchase,
        // Concurrent delivery lost the race against the unique index;
        // treat exactly like the pre-check hit.
        Err(e) if is_unique_violation(&e) => {
            tracing::info!(
                case_id = case.id,
                payment_ref = %input.payment_ref,
                "Duplicate purchase delivery short-circuited by unique index"
            );
            return Ok(PurchaseOutcome::Duplicate);
        }
        Err(e) => return Err(e.into()),
    };

    let updated = CaseRepo::apply_purchase_effects(&mut tx, case.id, &effects, now).await?;
    tx.commit().await.map_err(LifecycleError::Database)?;

    if effects.reactivate {
        tracing::info!(case_id = case.id, "Case reactivated from pending deletion by purchase");
    }

    if let PaymentEvent::StorageExtension { years, .. } = event {
        send_extension_confirmation(pool, mailer, &updated, *years).await;
    }

    Ok(PurchaseOutcome::Applied(purchase))
}

/// Confirmation email for a storage extension. Fire-and-forget: a send
/// failure is logged and never changes the purchase outcome.
async fn send_extension_confirmation(pool: &PgPool, mailer: &dyn Mailer, case: &Case, years: i32) {
    let Some(new_until) = case.retention_until else {
        return;
    };

    let owner = match UserRepo::find_by_id(pool, case.owner_id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(case_id = case.id, error = %e, "Owner lookup failed for confirmation email");
            return;
        }
    };

    let email = templates::storage_extension_confirmation(&case.title, years, new_until);
    if let Err(e) = mailer.send(&owner.email, &email).await {
        tracing::warn!(case_id = case.id, error = %e, "Storage extension confirmation email failed");
    }
}

/// Whether a sqlx error is a PostgreSQL unique constraint violation (23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}
