//! Lease-deadline reminder rules.
//!
//! Independent of storage retention: users attach deadline dates (notice
//! periods, inspection dates) to a case and get one reminder per configured
//! offset, at most one send per calendar day, and only while the case is in a
//! paid state.

use chrono::NaiveDate;

use crate::types::Timestamp;

/// Default reminder offsets in days before the deadline.
pub const DEFAULT_NOTIFY_OFFSETS: [i32; 3] = [7, 1, 0];

/// The offset that makes `today` a reminder day for `due_on`, if any.
///
/// Offsets count days before the deadline; `0` is the deadline day itself.
/// Past-due deadlines never match.
pub fn matched_offset(due_on: NaiveDate, today: NaiveDate, offsets: &[i32]) -> Option<i32> {
    let days_until = (due_on - today).num_days();
    if days_until < 0 {
        return None;
    }
    offsets
        .iter()
        .copied()
        .find(|&offset| i64::from(offset) == days_until)
}

/// Whether a reminder already went out today, at calendar-day granularity.
pub fn sent_today(last_sent: Option<Timestamp>, now: Timestamp) -> bool {
    last_sent.is_some_and(|sent| sent.date_naive() == now.date_naive())
}
