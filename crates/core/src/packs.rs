//! Purchasable pack vocabulary.
//!
//! A pack is a one-time purchase on a case. Evidence packs unlock sealing and
//! export for a phase; `storage_extension` buys additional retention years;
//! `related_contracts` is a feature unlock that never touches retention.

use serde::{Deserialize, Serialize};

use crate::stay::StayType;

/// A purchasable pack type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackType {
    Checkin,
    Moveout,
    Bundle,
    ShortStay,
    RelatedContracts,
    StorageExtension,
}

impl PackType {
    /// The canonical database/wire string for this pack type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Moveout => "moveout",
            Self::Bundle => "bundle",
            Self::ShortStay => "short_stay",
            Self::RelatedContracts => "related_contracts",
            Self::StorageExtension => "storage_extension",
        }
    }

    /// Parse a pack type string.
    ///
    /// Accepts the canonical names plus the suffixed storage-extension form
    /// `storage_extension-N`, in which case the extension years are returned
    /// alongside the pack. Returns `None` for unknown values and for
    /// malformed or non-positive year suffixes.
    pub fn parse(s: &str) -> Option<(Self, Option<i32>)> {
        match s {
            "checkin" => Some((Self::Checkin, None)),
            "moveout" => Some((Self::Moveout, None)),
            "bundle" => Some((Self::Bundle, None)),
            "short_stay" => Some((Self::ShortStay, None)),
            "related_contracts" => Some((Self::RelatedContracts, None)),
            "storage_extension" => Some((Self::StorageExtension, None)),
            other => {
                let years = other.strip_prefix("storage_extension-")?;
                let years: i32 = years.parse().ok()?;
                if years >= 1 {
                    Some((Self::StorageExtension, Some(years)))
                } else {
                    None
                }
            }
        }
    }

    /// Whether this pack may be purchased on a case of the given stay type.
    ///
    /// Phase evidence packs are shape-specific: a short-stay pack on a
    /// long-term case (or vice versa) would silently grant capabilities for
    /// the wrong tenancy shape, so ingestion rejects the mismatch outright.
    pub fn valid_for(self, stay: StayType) -> bool {
        match self {
            Self::Checkin | Self::Moveout | Self::Bundle => stay == StayType::LongTerm,
            Self::ShortStay => stay == StayType::ShortStay,
            Self::RelatedContracts | Self::StorageExtension => true,
        }
    }

    /// Whether this pack is an evidence pack (deduplicated per case) as
    /// opposed to a repeatable storage-duration purchase.
    pub fn is_evidence_pack(self) -> bool {
        !matches!(self, Self::StorageExtension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_canonical_strings() {
        for pack in [
            PackType::Checkin,
            PackType::Moveout,
            PackType::Bundle,
            PackType::ShortStay,
            PackType::RelatedContracts,
            PackType::StorageExtension,
        ] {
            assert_eq!(PackType::parse(pack.as_str()), Some((pack, None)));
        }
    }

    #[test]
    fn parse_accepts_suffixed_storage_extension() {
        assert_eq!(
            PackType::parse("storage_extension-3"),
            Some((PackType::StorageExtension, Some(3)))
        );
        assert_eq!(
            PackType::parse("storage_extension-1"),
            Some((PackType::StorageExtension, Some(1)))
        );
    }

    #[test]
    fn parse_rejects_bad_suffixes() {
        assert_eq!(PackType::parse("storage_extension-0"), None);
        assert_eq!(PackType::parse("storage_extension--2"), None);
        assert_eq!(PackType::parse("storage_extension-abc"), None);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(PackType::parse("deluxe"), None);
    }

    #[test]
    fn phase_packs_are_stay_specific() {
        assert!(PackType::Checkin.valid_for(StayType::LongTerm));
        assert!(!PackType::Checkin.valid_for(StayType::ShortStay));
        assert!(PackType::Bundle.valid_for(StayType::LongTerm));
        assert!(!PackType::Bundle.valid_for(StayType::ShortStay));
        assert!(PackType::ShortStay.valid_for(StayType::ShortStay));
        assert!(!PackType::ShortStay.valid_for(StayType::LongTerm));
    }

    #[test]
    fn shared_packs_fit_both_shapes() {
        for stay in [StayType::LongTerm, StayType::ShortStay] {
            assert!(PackType::RelatedContracts.valid_for(stay));
            assert!(PackType::StorageExtension.valid_for(stay));
        }
    }

    #[test]
    fn storage_extension_is_not_an_evidence_pack() {
        assert!(!PackType::StorageExtension.is_evidence_pack());
        assert!(PackType::Checkin.is_evidence_pack());
        assert!(PackType::RelatedContracts.is_evidence_pack());
    }
}
