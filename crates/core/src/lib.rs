//! Leasevault domain core.
//!
//! Pure domain logic with zero internal dependencies: pack and stay-type
//! vocabulary, the entitlement resolver, retention arithmetic, lease-deadline
//! reminder rules, webhook signing, and the shared error type. Everything in
//! this crate is side-effect free so the repository and lifecycle layers can
//! be tested against it without a database.

pub mod cache;
pub mod deadlines;
pub mod entitlements;
pub mod error;
pub mod packs;
pub mod retention;
pub mod signing;
pub mod stay;
pub mod types;
