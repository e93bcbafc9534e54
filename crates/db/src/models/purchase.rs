//! Purchase ledger models.
//!
//! One row per completed payment event, immutable once inserted. A case's
//! entitlements are the union over all of its purchase rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leasevault_core::error::CoreError;
use leasevault_core::packs::PackType;
use leasevault_core::types::{DbId, Timestamp};

/// A row from the `purchases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Purchase {
    pub id: DbId,
    pub case_id: DbId,
    pub owner_id: DbId,
    pub pack_type: String,
    /// Extension years; set only for storage-extension purchases.
    pub storage_years: Option<i32>,
    pub amount_cents: i64,
    pub currency: String,
    /// External payment reference, unique across all purchases.
    pub payment_ref: String,
    pub created_at: Timestamp,
}

impl Purchase {
    /// Typed pack type, failing on a value outside the CHECK constraint.
    pub fn pack_type(&self) -> Result<PackType, CoreError> {
        PackType::parse(&self.pack_type)
            .map(|(pack, _)| pack)
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "purchase {} has invalid pack_type '{}'",
                    self.id, self.pack_type
                ))
            })
    }
}

/// DTO for appending to the purchase ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchase {
    pub case_id: DbId,
    pub owner_id: DbId,
    pub pack_type: PackType,
    pub storage_years: Option<i32>,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_ref: String,
}
