//! Email template catalogue.
//!
//! Every outbound email is rendered here so copy and template ids live in one
//! place. Retention reminders split by stay type: short-stay copy speaks in
//! the 30-day storage window, long-term copy in the 12-month term.

use chrono::NaiveDate;

use leasevault_core::stay::StayType;
use leasevault_core::types::Timestamp;

/// A rendered email ready for a [`crate::Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub template_id: &'static str,
    pub subject: String,
    pub body: String,
}

/// Render the retention reminder for a reminder level (1..=3).
///
/// Level 1 is the 60-day notice, which only long-term cases can reach (a
/// short-stay term is 30 days to begin with); levels 2 and 3 are the 30-day
/// and final-week notices.
pub fn retention_reminder(
    stay: StayType,
    level: i16,
    case_title: &str,
    retention_until: Timestamp,
) -> RenderedEmail {
    let until = retention_until.format("%Y-%m-%d");

    match (level, stay) {
        (1, _) => RenderedEmail {
            template_id: "retention-reminder-60",
            subject: format!("Your documents for \"{case_title}\" expire in two months"),
            body: format!(
                "The 12-month storage term for \"{case_title}\" ends on {until}. \
                 Extend your storage to keep contracts, photos and videos available."
            ),
        },
        (2, StayType::LongTerm) => RenderedEmail {
            template_id: "retention-reminder-30-long-term",
            subject: format!("30 days left for \"{case_title}\""),
            body: format!(
                "The 12-month storage term for \"{case_title}\" ends on {until}. \
                 After that date your case enters a 30-day grace period before deletion."
            ),
        },
        (2, StayType::ShortStay) => RenderedEmail {
            template_id: "retention-reminder-30-short-stay",
            subject: format!("Your stay evidence for \"{case_title}\" expires soon"),
            body: format!(
                "The 30-day storage window for \"{case_title}\" ends on {until}. \
                 Extend your storage to keep your arrival and departure evidence."
            ),
        },
        (_, StayType::LongTerm) => RenderedEmail {
            template_id: "retention-reminder-final-long-term",
            subject: format!("Final notice: \"{case_title}\" expires this week"),
            body: format!(
                "The 12-month storage term for \"{case_title}\" ends on {until}. \
                 This is the last reminder before the deletion grace period begins."
            ),
        },
        (_, StayType::ShortStay) => RenderedEmail {
            template_id: "retention-reminder-final-short-stay",
            subject: format!("Final notice: \"{case_title}\" expires this week"),
            body: format!(
                "The 30-day storage window for \"{case_title}\" ends on {until}. \
                 This is the last reminder before the deletion grace period begins."
            ),
        },
    }
}

/// Render the confirmation for a storage-extension purchase.
pub fn storage_extension_confirmation(
    case_title: &str,
    years: i32,
    new_until: Timestamp,
) -> RenderedEmail {
    let until = new_until.format("%Y-%m-%d");
    RenderedEmail {
        template_id: "storage-extension-confirmation",
        subject: format!("Storage extended for \"{case_title}\""),
        body: format!(
            "Your storage for \"{case_title}\" was extended by {years} year(s) \
             and now runs until {until}."
        ),
    }
}

/// Render a lease-deadline reminder.
pub fn deadline_reminder(
    case_title: &str,
    label: &str,
    due_on: NaiveDate,
    days_left: i32,
) -> RenderedEmail {
    let due = due_on.format("%Y-%m-%d");
    let when = match days_left {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {n} days"),
    };
    RenderedEmail {
        template_id: "deadline-reminder",
        subject: format!("\"{label}\" for \"{case_title}\" is due {when}"),
        body: format!("Your deadline \"{label}\" for \"{case_title}\" is due {when}, on {due}."),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
