//! Payment-completed event types.
//!
//! The payment processor delivers a loose JSON payload; the boundary
//! converts it into a tagged [`PaymentEvent`] per pack shape and rejects
//! anything unknown or inconsistent outright, so no downstream code ever
//! defaults a missing field.

use serde::Deserialize;

use leasevault_core::error::CoreError;
use leasevault_core::packs::PackType;
use leasevault_core::stay::StayType;
use leasevault_core::types::DbId;

/// The raw webhook payload, exactly as the payment processor sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventPayload {
    pub record_id: DbId,
    pub pack_type: String,
    pub payment_ref: String,
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
    /// Optional cross-check against the case's stay type.
    #[serde(default)]
    pub stay_type_hint: Option<String>,
    /// Extension years; only meaningful for storage extensions.
    #[serde(default)]
    pub years: Option<i32>,
}

/// A validated payment event, tagged by pack shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    /// An evidence pack or feature unlock, one-shot per case.
    EvidencePack {
        case_id: DbId,
        pack: PackType,
        payment_ref: String,
        amount_cents: i64,
        currency: String,
        stay_type_hint: Option<StayType>,
    },
    /// A repeatable storage-duration purchase.
    StorageExtension {
        case_id: DbId,
        years: i32,
        payment_ref: String,
        amount_cents: i64,
        currency: String,
    },
}

impl PaymentEvent {
    /// The case this event targets.
    pub fn case_id(&self) -> DbId {
        match self {
            Self::EvidencePack { case_id, .. } | Self::StorageExtension { case_id, .. } => *case_id,
        }
    }
}

impl TryFrom<PaymentEventPayload> for PaymentEvent {
    type Error = CoreError;

    fn try_from(payload: PaymentEventPayload) -> Result<Self, Self::Error> {
        if payload.payment_ref.trim().is_empty() {
            return Err(CoreError::Validation("payment_ref must not be empty".into()));
        }
        if payload.currency.trim().is_empty() {
            return Err(CoreError::Validation("currency must not be empty".into()));
        }

        let (pack, suffix_years) = PackType::parse(&payload.pack_type).ok_or_else(|| {
            CoreError::Validation(format!("unknown pack_type '{}'", payload.pack_type))
        })?;

        let stay_type_hint = match &payload.stay_type_hint {
            None => None,
            Some(hint) => Some(StayType::parse(hint).ok_or_else(|| {
                CoreError::Validation(format!("unknown stay_type_hint '{hint}'"))
            })?),
        };

        if pack == PackType::StorageExtension {
            // Years come from either the suffix form or the years field;
            // both present must agree, neither present is malformed.
            let years = match (suffix_years, payload.years) {
                (Some(a), Some(b)) if a != b => {
                    return Err(CoreError::Validation(format!(
                        "pack_type suffix ({a}) and years field ({b}) disagree"
                    )))
                }
                (Some(years), _) | (None, Some(years)) => years,
                (None, None) => {
                    return Err(CoreError::Validation(
                        "storage_extension event is missing years".into(),
                    ))
                }
            };
            if years < 1 {
                return Err(CoreError::Validation(format!(
                    "storage_extension years must be >= 1, got {years}"
                )));
            }
            Ok(Self::StorageExtension {
                case_id: payload.record_id,
                years,
                payment_ref: payload.payment_ref,
                amount_cents: payload.amount,
                currency: payload.currency,
            })
        } else {
            if payload.years.is_some() {
                return Err(CoreError::Validation(format!(
                    "years is not valid for pack_type '{}'",
                    payload.pack_type
                )));
            }
            Ok(Self::EvidencePack {
                case_id: payload.record_id,
                pack,
                payment_ref: payload.payment_ref,
                amount_cents: payload.amount,
                currency: payload.currency,
                stay_type_hint,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn payload(pack_type: &str) -> PaymentEventPayload {
        PaymentEventPayload {
            record_id: 7,
            pack_type: pack_type.to_string(),
            payment_ref: "pay_123".to_string(),
            amount: 2900,
            currency: "EUR".to_string(),
            stay_type_hint: None,
            years: None,
        }
    }

    #[test]
    fn evidence_pack_converts() {
        let event = PaymentEvent::try_from(payload("checkin")).unwrap();
        assert_matches!(
            event,
            PaymentEvent::EvidencePack {
                case_id: 7,
                pack: PackType::Checkin,
                ..
            }
        );
    }

    #[test]
    fn unknown_pack_is_rejected() {
        assert_matches!(
            PaymentEvent::try_from(payload("platinum")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn storage_extension_needs_years() {
        assert_matches!(
            PaymentEvent::try_from(payload("storage_extension")),
            Err(CoreError::Validation(_))
        );

        let mut with_years = payload("storage_extension");
        with_years.years = Some(2);
        assert_matches!(
            PaymentEvent::try_from(with_years),
            Ok(PaymentEvent::StorageExtension { years: 2, .. })
        );
    }

    #[test]
    fn storage_extension_suffix_form_carries_years() {
        assert_matches!(
            PaymentEvent::try_from(payload("storage_extension-3")),
            Ok(PaymentEvent::StorageExtension { years: 3, .. })
        );
    }

    #[test]
    fn disagreeing_year_forms_are_rejected() {
        let mut p = payload("storage_extension-3");
        p.years = Some(2);
        assert_matches!(PaymentEvent::try_from(p), Err(CoreError::Validation(_)));
    }

    #[test]
    fn years_on_an_evidence_pack_is_malformed() {
        let mut p = payload("bundle");
        p.years = Some(1);
        assert_matches!(PaymentEvent::try_from(p), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bad_stay_hint_is_rejected() {
        let mut p = payload("checkin");
        p.stay_type_hint = Some("hotel".to_string());
        assert_matches!(PaymentEvent::try_from(p), Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_payment_ref_is_rejected() {
        let mut p = payload("checkin");
        p.payment_ref = "  ".to_string();
        assert_matches!(PaymentEvent::try_from(p), Err(CoreError::Validation(_)));
    }
}
