//! Tenancy shape of a case.

use serde::{Deserialize, Serialize};

/// How a case tracks its tenancy. Immutable after creation.
///
/// Short-stay cases reuse the two completion timestamps as arrival/departure
/// instead of check-in/handover; the stored shape is identical, only the
/// vocabulary and the retention window differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayType {
    LongTerm,
    ShortStay,
}

impl StayType {
    /// The canonical database/wire string for this stay type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LongTerm => "long_term",
            Self::ShortStay => "short_stay",
        }
    }

    /// Parse the canonical string form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "long_term" => Some(Self::LongTerm),
            "short_stay" => Some(Self::ShortStay),
            _ => None,
        }
    }
}
