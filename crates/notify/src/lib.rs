//! Transactional email collaborator.
//!
//! The lifecycle treats email as an opaque call with a success/failure
//! outcome: render a template, hand it to the [`Mailer`], and react only to
//! the result. SMTP delivery is one implementation; unconfigured
//! environments log instead of sending.

pub mod mailer;
pub mod templates;

pub use mailer::{EmailConfig, EmailError, LogMailer, Mailer, SmtpMailer};
pub use templates::RenderedEmail;
