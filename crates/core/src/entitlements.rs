//! The entitlement resolver.
//!
//! Pure projection from a case and its purchased packs to the capability set
//! every other feature (sealing, PDF export, upload gating, upsell display)
//! reads. No mutation, no I/O: callers load the case row and its purchase
//! ledger, convert to [`CaseFacts`], and call [`resolve`].

use serde::Serialize;

use crate::packs::PackType;
use crate::stay::StayType;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Resolver input
// ---------------------------------------------------------------------------

/// The subset of a case row the resolver reads.
#[derive(Debug, Clone)]
pub struct CaseFacts {
    pub stay_type: StayType,
    /// First completion timestamp. Arrival for short stays.
    pub checkin_completed_at: Option<Timestamp>,
    /// Second completion timestamp. Departure for short stays.
    pub handover_completed_at: Option<Timestamp>,
    pub retention_until: Option<Timestamp>,
}

/// The two evidence phases of a case.
///
/// Short-stay cases read these as arrival/departure; the stored timestamps
/// are the same two columns either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Checkin,
    Handover,
}

// ---------------------------------------------------------------------------
// Resolver output
// ---------------------------------------------------------------------------

/// The capability set a case currently grants its owner.
///
/// `available_packs` is upsell display data only; every access decision goes
/// through the `has_*` and `can_*` flags.
#[derive(Debug, Clone, Serialize)]
pub struct Entitlements {
    pub stay_type: StayType,

    pub has_checkin_pack: bool,
    pub has_moveout_pack: bool,
    pub has_short_stay_pack: bool,
    pub has_related_contracts_pack: bool,

    pub can_upload_checkin: bool,
    pub can_upload_handover: bool,
    pub can_seal_checkin: bool,
    pub can_seal_handover: bool,
    pub can_export_checkin: bool,
    pub can_export_handover: bool,

    pub is_expired: bool,
    pub available_packs: Vec<PackType>,
}

impl Entitlements {
    /// Whether the given phase may be sealed right now.
    pub fn can_seal(&self, phase: Phase) -> bool {
        match phase {
            Phase::Checkin => self.can_seal_checkin,
            Phase::Handover => self.can_seal_handover,
        }
    }

    /// Whether the given phase may be exported right now.
    pub fn can_export(&self, phase: Phase) -> bool {
        match phase {
            Phase::Checkin => self.can_export_checkin,
            Phase::Handover => self.can_export_handover,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the capability set for a case from its purchase ledger.
///
/// A `bundle` purchase satisfies both `checkin` and `moveout` checks; no
/// phase-specific gate ever tests for `bundle` directly, so the implication
/// here is the only place it is applied.
pub fn resolve(case: &CaseFacts, packs: &[PackType], now: Timestamp) -> Entitlements {
    let owns = |p: PackType| packs.contains(&p);

    let has_bundle = owns(PackType::Bundle);
    let has_checkin_pack = owns(PackType::Checkin) || has_bundle;
    let has_moveout_pack = owns(PackType::Moveout) || has_bundle;
    let has_short_stay_pack = owns(PackType::ShortStay);
    let has_related_contracts_pack = owns(PackType::RelatedContracts);

    // Sealing requires the phase's pack for this stay shape. Uploading does
    // not: the free preview allows uploads in both phases until the phase is
    // sealed.
    let (checkin_pack_held, handover_pack_held) = match case.stay_type {
        StayType::LongTerm => (has_checkin_pack, has_moveout_pack),
        StayType::ShortStay => (has_short_stay_pack, has_short_stay_pack),
    };

    let checkin_sealed = case.checkin_completed_at.is_some();
    let handover_sealed = case.handover_completed_at.is_some();

    let can_seal_checkin = checkin_pack_held;
    let can_seal_handover = handover_pack_held;

    let is_expired = case.retention_until.is_some_and(|until| now > until);

    Entitlements {
        stay_type: case.stay_type,
        has_checkin_pack,
        has_moveout_pack,
        has_short_stay_pack,
        has_related_contracts_pack,
        can_upload_checkin: !checkin_sealed,
        can_upload_handover: !handover_sealed,
        can_seal_checkin,
        can_seal_handover,
        can_export_checkin: can_seal_checkin && checkin_sealed,
        can_export_handover: can_seal_handover && handover_sealed,
        is_expired,
        available_packs: available_packs(case, packs),
    }
}

/// Packs not yet owned that are valid for this case's stay shape.
///
/// A pack is listed only when buying it would grant something new: `bundle`
/// disappears once both constituents are owned, and `storage_extension` only
/// appears once there is a retention term to extend.
fn available_packs(case: &CaseFacts, packs: &[PackType]) -> Vec<PackType> {
    let owns = |p: PackType| packs.contains(&p);
    let has_bundle = owns(PackType::Bundle);
    let has_checkin = owns(PackType::Checkin) || has_bundle;
    let has_moveout = owns(PackType::Moveout) || has_bundle;

    let mut available = Vec::new();
    match case.stay_type {
        StayType::LongTerm => {
            if !has_checkin {
                available.push(PackType::Checkin);
            }
            if !has_moveout {
                available.push(PackType::Moveout);
            }
            if !has_checkin && !has_moveout {
                available.push(PackType::Bundle);
            }
        }
        StayType::ShortStay => {
            if !owns(PackType::ShortStay) {
                available.push(PackType::ShortStay);
            }
        }
    }
    if !owns(PackType::RelatedContracts) {
        available.push(PackType::RelatedContracts);
    }
    if case.retention_until.is_some() {
        available.push(PackType::StorageExtension);
    }
    available
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn long_term_case() -> CaseFacts {
        CaseFacts {
            stay_type: StayType::LongTerm,
            checkin_completed_at: None,
            handover_completed_at: None,
            retention_until: None,
        }
    }

    fn short_stay_case() -> CaseFacts {
        CaseFacts {
            stay_type: StayType::ShortStay,
            ..long_term_case()
        }
    }

    #[test]
    fn unpurchased_long_term_can_upload_but_not_seal_or_export() {
        let ent = resolve(&long_term_case(), &[], Utc::now());
        assert!(ent.can_upload_checkin);
        assert!(ent.can_upload_handover);
        assert!(!ent.can_seal_checkin);
        assert!(!ent.can_seal_handover);
        assert!(!ent.can_export_checkin);
        assert!(!ent.can_export_handover);
    }

    #[test]
    fn bundle_implies_both_phase_packs() {
        let ent = resolve(&long_term_case(), &[PackType::Bundle], Utc::now());
        assert!(ent.has_checkin_pack);
        assert!(ent.has_moveout_pack);
        assert!(ent.can_seal_checkin);
        assert!(ent.can_seal_handover);
    }

    #[test]
    fn checkin_pack_gates_only_its_phase() {
        let ent = resolve(&long_term_case(), &[PackType::Checkin], Utc::now());
        assert!(ent.can_seal_checkin);
        assert!(!ent.can_seal_handover);
    }

    #[test]
    fn short_stay_pack_gates_both_phases() {
        let ent = resolve(&short_stay_case(), &[PackType::ShortStay], Utc::now());
        assert!(ent.can_seal_checkin);
        assert!(ent.can_seal_handover);
    }

    #[test]
    fn long_term_packs_grant_nothing_on_short_stay() {
        // A bundle row on a short-stay case (which ingestion would have
        // rejected) must not unlock sealing for the wrong shape.
        let ent = resolve(&short_stay_case(), &[PackType::Bundle], Utc::now());
        assert!(!ent.can_seal_checkin);
        assert!(!ent.can_seal_handover);
    }

    #[test]
    fn export_requires_seal_timestamp() {
        let now = Utc::now();
        let mut case = long_term_case();
        let packs = [PackType::Bundle];

        let ent = resolve(&case, &packs, now);
        assert!(!ent.can_export_checkin);

        case.checkin_completed_at = Some(now - Duration::days(1));
        let ent = resolve(&case, &packs, now);
        assert!(ent.can_export_checkin);
        assert!(!ent.can_export_handover);
    }

    #[test]
    fn sealed_phase_blocks_further_uploads() {
        let now = Utc::now();
        let mut case = long_term_case();
        case.checkin_completed_at = Some(now);
        let ent = resolve(&case, &[], now);
        assert!(!ent.can_upload_checkin);
        assert!(ent.can_upload_handover);
    }

    #[test]
    fn expired_flag_follows_retention_until() {
        let now = Utc::now();
        let mut case = long_term_case();

        assert!(!resolve(&case, &[], now).is_expired);

        case.retention_until = Some(now + Duration::days(1));
        assert!(!resolve(&case, &[], now).is_expired);

        case.retention_until = Some(now - Duration::seconds(1));
        assert!(resolve(&case, &[], now).is_expired);
    }

    #[test]
    fn available_packs_shrink_as_packs_are_bought() {
        let now = Utc::now();
        let ent = resolve(&long_term_case(), &[], now);
        assert_eq!(
            ent.available_packs,
            vec![
                PackType::Checkin,
                PackType::Moveout,
                PackType::Bundle,
                PackType::RelatedContracts
            ]
        );

        let ent = resolve(&long_term_case(), &[PackType::Checkin], now);
        assert_eq!(
            ent.available_packs,
            vec![PackType::Moveout, PackType::RelatedContracts]
        );
    }

    #[test]
    fn storage_extension_offered_once_retention_exists() {
        let now = Utc::now();
        let mut case = short_stay_case();
        case.retention_until = Some(now + Duration::days(10));
        let ent = resolve(&case, &[PackType::ShortStay], now);
        assert_eq!(
            ent.available_packs,
            vec![PackType::RelatedContracts, PackType::StorageExtension]
        );
    }

    #[test]
    fn available_packs_never_gate_access() {
        // Owning nothing leaves every capability gate closed even though the
        // upsell list is at its fullest.
        let ent = resolve(&long_term_case(), &[], Utc::now());
        assert!(!ent.available_packs.is_empty());
        assert!(!ent.can_seal_checkin && !ent.can_seal_handover);
    }
}
