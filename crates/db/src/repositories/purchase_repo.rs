//! Repository for the `purchases` ledger.
//!
//! The ledger is append-only: rows are inserted by purchase ingestion and
//! only ever removed by the cascade when their case is deleted. The partial
//! unique index `uq_purchases_case_pack` is the storage-layer duplicate
//! guard; callers map its 23505 violation to a duplicate outcome.

use sqlx::{PgConnection, PgPool};

use leasevault_core::packs::PackType;
use leasevault_core::types::DbId;

use crate::models::purchase::{CreatePurchase, Purchase};

/// Column list for `purchases` queries.
const PURCHASE_COLUMNS: &str = "\
    id, case_id, owner_id, pack_type, storage_years, \
    amount_cents, currency, payment_ref, created_at";

/// Provides append and lookup operations for the purchase ledger.
pub struct PurchaseRepo;

impl PurchaseRepo {
    /// Append a purchase inside the caller's transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreatePurchase,
    ) -> Result<Purchase, sqlx::Error> {
        let query = format!(
            "INSERT INTO purchases (\
                case_id, owner_id, pack_type, storage_years, \
                amount_cents, currency, payment_ref\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PURCHASE_COLUMNS}"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(input.case_id)
            .bind(input.owner_id)
            .bind(input.pack_type.as_str())
            .bind(input.storage_years)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(&input.payment_ref)
            .fetch_one(&mut *conn)
            .await
    }

    /// Whether an evidence pack of this type is already on the ledger for
    /// the case. Pre-insert duplicate check; the unique index remains the
    /// authoritative guard under concurrent delivery.
    pub async fn exists_for_case_pack(
        pool: &PgPool,
        case_id: DbId,
        pack: PackType,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM purchases WHERE case_id = $1 AND pack_type = $2",
        )
        .bind(case_id)
        .bind(pack.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count.0 > 0)
    }

    /// All purchases for a case, oldest first.
    pub async fn list_for_case(pool: &PgPool, case_id: DbId) -> Result<Vec<Purchase>, sqlx::Error> {
        let query = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE case_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }

    /// The distinct pack types owned by a case, parsed into the typed
    /// vocabulary. Unknown values are skipped (the CHECK constraint makes
    /// them unreachable in practice).
    pub async fn pack_types_for_case(
        pool: &PgPool,
        case_id: DbId,
    ) -> Result<Vec<PackType>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT pack_type FROM purchases WHERE case_id = $1")
                .bind(case_id)
                .fetch_all(pool)
                .await?;
        Ok(rows
            .iter()
            .filter_map(|(s,)| PackType::parse(s).map(|(pack, _)| pack))
            .collect())
    }

    /// Ledger totals: (row count, revenue in cents).
    pub async fn totals(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(amount_cents), 0)::bigint FROM purchases",
        )
        .fetch_one(pool)
        .await?;
        Ok(row)
    }
}
