//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//!
//! Enum-ish TEXT columns are kept as `String` in the row structs; typed views
//! are produced at use sites via the fallible accessors, so a value that
//! escapes its CHECK constraint surfaces as an internal error instead of a
//! silent default.

pub mod asset;
pub mod audit;
pub mod case;
pub mod deadline;
pub mod purchase;
pub mod user;
