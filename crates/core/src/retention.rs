//! Retention arithmetic and the reminder ladder.
//!
//! All stage transitions of the retention state machine compare `now` against
//! stored timestamps; the comparisons and the resulting target values live
//! here as pure functions so the scanner and ingestion stay thin and the
//! boundaries are unit-testable without a clock or a database.

use chrono::{Duration, Months};

use crate::packs::PackType;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Days between expiry and irreversible purge.
pub const GRACE_PERIOD_DAYS: i64 = 30;

/// Retention granted by a short-stay pack, counted from departure.
pub const SHORT_STAY_RETENTION_DAYS: i64 = 30;

/// Retention granted by a long-term evidence pack, counted from purchase.
pub const LONG_TERM_RETENTION_MONTHS: u32 = 12;

/// Reminder window boundaries in days remaining, widest first.
pub const REMINDER_WINDOW_DAYS: [i64; 3] = [60, 30, 7];

/// Highest reminder level; reached inside the final window.
pub const MAX_REMINDER_LEVEL: i16 = 3;

const SECS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Reminder ladder
// ---------------------------------------------------------------------------

/// Whole days remaining until `until`, rounded up.
///
/// A retention term expiring later today still counts as one remaining day;
/// a term already past yields zero or a negative count.
pub fn days_remaining(until: Timestamp, now: Timestamp) -> i64 {
    (until - now).num_seconds().div_ceil(SECS_PER_DAY)
}

/// The reminder level a case should be at, given its retention deadline.
///
/// Level 3 inside the final week, 2 inside 30 days, 1 inside 60 days, else 0.
/// The scanner only ever raises the stored level towards this target, so each
/// level fires exactly once per purchase cycle and re-running the scan on an
/// unchanged clock is a no-op.
pub fn target_reminder_level(retention_until: Timestamp, now: Timestamp) -> i16 {
    let days = days_remaining(retention_until, now);
    if days <= 0 {
        0
    } else if days <= REMINDER_WINDOW_DAYS[2] {
        3
    } else if days <= REMINDER_WINDOW_DAYS[1] {
        2
    } else if days <= REMINDER_WINDOW_DAYS[0] {
        1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Retention terms
// ---------------------------------------------------------------------------

/// When the grace period of a record expiring now runs out.
pub fn grace_deadline(now: Timestamp) -> Timestamp {
    now + Duration::days(GRACE_PERIOD_DAYS)
}

/// The retention deadline granted by an evidence-pack purchase.
///
/// Short-stay packs protect for 30 days past departure (falling back to the
/// purchase time when departure is not yet known); long-term packs protect
/// for 12 months from purchase. `related_contracts` is a feature unlock and
/// grants no retention; `storage_extension` is handled by
/// [`extended_retention`].
pub fn initial_retention(
    pack: PackType,
    departure: Option<Timestamp>,
    purchased_at: Timestamp,
) -> Option<Timestamp> {
    match pack {
        PackType::ShortStay => {
            Some(departure.unwrap_or(purchased_at) + Duration::days(SHORT_STAY_RETENTION_DAYS))
        }
        PackType::Checkin | PackType::Moveout | PackType::Bundle => {
            Some(purchased_at + Months::new(LONG_TERM_RETENTION_MONTHS))
        }
        PackType::RelatedContracts | PackType::StorageExtension => None,
    }
}

/// The retention deadline after buying `years` extension years.
///
/// Extends from the current deadline when it is still in the future, and from
/// `now` when the term has already lapsed, so a purchase during the grace
/// period buys the full extension rather than a shortened remainder.
pub fn extended_retention(current: Option<Timestamp>, now: Timestamp, years: i32) -> Timestamp {
    let base = match current {
        Some(until) if until > now => until,
        _ => now,
    };
    base + Months::new(12 * years.max(0) as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn days_remaining_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_remaining(now + Duration::hours(1), now), 1);
        assert_eq!(days_remaining(now + Duration::days(5), now), 5);
        assert_eq!(
            days_remaining(now + Duration::days(5) + Duration::seconds(1), now),
            6
        );
        assert_eq!(days_remaining(now - Duration::hours(1), now), 0);
        assert_eq!(days_remaining(now - Duration::days(2), now), -2);
    }

    #[test]
    fn level_boundaries() {
        let now = Utc::now();
        let at_days = |d: i64| target_reminder_level(now + Duration::days(d), now);

        assert_eq!(at_days(61), 0);
        assert_eq!(at_days(60), 1);
        assert_eq!(at_days(31), 1);
        assert_eq!(at_days(30), 2);
        assert_eq!(at_days(8), 2);
        assert_eq!(at_days(7), 3);
        assert_eq!(at_days(1), 3);
    }

    #[test]
    fn level_is_zero_once_expired() {
        let now = Utc::now();
        assert_eq!(target_reminder_level(now - Duration::seconds(1), now), 0);
        assert_eq!(target_reminder_level(now - Duration::days(10), now), 0);
    }

    #[test]
    fn partial_final_day_is_still_level_three() {
        let now = Utc::now();
        assert_eq!(target_reminder_level(now + Duration::hours(5), now), 3);
    }

    #[test]
    fn short_stay_retention_counts_from_departure() {
        let purchased = Utc::now();
        let departure = purchased + Duration::days(4);
        assert_eq!(
            initial_retention(PackType::ShortStay, Some(departure), purchased),
            Some(departure + Duration::days(SHORT_STAY_RETENTION_DAYS))
        );
    }

    #[test]
    fn short_stay_retention_falls_back_to_purchase_time() {
        let purchased = Utc::now();
        assert_eq!(
            initial_retention(PackType::ShortStay, None, purchased),
            Some(purchased + Duration::days(SHORT_STAY_RETENTION_DAYS))
        );
    }

    #[test]
    fn long_term_packs_grant_twelve_months() {
        let purchased = Utc::now();
        for pack in [PackType::Checkin, PackType::Moveout, PackType::Bundle] {
            assert_eq!(
                initial_retention(pack, None, purchased),
                Some(purchased + Months::new(12))
            );
        }
    }

    #[test]
    fn related_contracts_grants_no_retention() {
        assert_eq!(
            initial_retention(PackType::RelatedContracts, None, Utc::now()),
            None
        );
    }

    #[test]
    fn extension_stacks_on_a_live_term() {
        let now = Utc::now();
        let current = now + Duration::days(100);
        assert_eq!(
            extended_retention(Some(current), now, 2),
            current + Months::new(24)
        );
    }

    #[test]
    fn extension_restarts_from_now_after_lapse() {
        let now = Utc::now();
        let lapsed = now - Duration::days(10);
        assert_eq!(
            extended_retention(Some(lapsed), now, 1),
            now + Months::new(12)
        );
        assert_eq!(extended_retention(None, now, 1), now + Months::new(12));
    }

    #[test]
    fn grace_deadline_is_thirty_days_out() {
        let now = Utc::now();
        assert_eq!(grace_deadline(now), now + Duration::days(30));
    }
}
