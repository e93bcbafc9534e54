//! Repository for the `assets` table.

use sqlx::PgPool;

use leasevault_core::types::DbId;

use crate::models::asset::{Asset, CreateAsset};

/// Column list for `assets` queries.
const ASSET_COLUMNS: &str = "\
    id, case_id, phase, kind, storage_path, file_size_bytes, created_at";

/// Provides CRUD operations for stored files.
pub struct AssetRepo;

impl AssetRepo {
    /// Register an uploaded file against a case.
    pub async fn create(
        pool: &PgPool,
        case_id: DbId,
        input: &CreateAsset,
    ) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets (case_id, phase, kind, storage_path, file_size_bytes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ASSET_COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(case_id)
            .bind(input.phase.as_deref())
            .bind(&input.kind)
            .bind(&input.storage_path)
            .bind(input.file_size_bytes.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    /// All assets owned by a case, oldest first.
    pub async fn list_for_case(pool: &PgPool, case_id: DbId) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM assets \
             WHERE case_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }

    /// The storage paths of all assets owned by a case, for purge.
    pub async fn storage_paths_for_case(
        pool: &PgPool,
        case_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT storage_path FROM assets WHERE case_id = $1")
                .bind(case_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(path,)| path).collect())
    }
}
