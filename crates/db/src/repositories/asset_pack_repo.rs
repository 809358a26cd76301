//! Repository for the `asset_packs` table.
//!
//! Status writes are guarded by the legal source states from
//! [`AssetPackStatus::sources_of`]; a guarded update that matches no row
//! returns `None` and the caller decides between "missing" and "conflict".

use layerforge_core::status::AssetPackStatus;
use layerforge_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::models::asset_pack::{AssetPack, AssetPackTotals, CreateAssetPack};

/// Column list for `asset_packs` queries.
const COLUMNS: &str = "\
    id, user_id, name, description, thumbnail_url, original_image_url, \
    status, total_layers, total_expressions, created_at, updated_at";

fn source_statuses(next: AssetPackStatus) -> Vec<String> {
    AssetPackStatus::sources_of(next)
        .into_iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Provides CRUD operations for asset packs.
pub struct AssetPackRepo;

impl AssetPackRepo {
    /// Insert a new pack in `pending` status.
    pub async fn create(pool: &PgPool, input: &CreateAssetPack) -> Result<AssetPack, sqlx::Error> {
        let query = format!(
            "INSERT INTO asset_packs \
                 (id, user_id, name, description, thumbnail_url, original_image_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(new_id())
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.thumbnail_url)
            .bind(&input.original_image_url)
            .bind(AssetPackStatus::Pending.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a pack by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AssetPack>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM asset_packs WHERE id = $1");
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List packs newest-first.
    pub async fn list(pool: &PgPool, limit: i64) -> Result<Vec<AssetPack>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM asset_packs \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Move a pack to `status` if its current status allows it.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: AssetPackStatus,
    ) -> Result<Option<AssetPack>, sqlx::Error> {
        let query = format!(
            "UPDATE asset_packs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(source_statuses(status))
            .fetch_optional(pool)
            .await
    }

    /// Move a `pending` pack to `processing`. Any other status matches no
    /// row, so concurrent claims on one pack succeed at most once.
    pub async fn claim(pool: &PgPool, id: DbId) -> Result<Option<AssetPack>, sqlx::Error> {
        let query = format!(
            "UPDATE asset_packs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(id)
            .bind(AssetPackStatus::Processing.as_str())
            .bind(AssetPackStatus::Pending.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Mark a pack `completed` and record its layer totals.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        totals: AssetPackTotals,
    ) -> Result<Option<AssetPack>, sqlx::Error> {
        let query = format!(
            "UPDATE asset_packs \
             SET status = $2, total_layers = $3, total_expressions = $4, updated_at = NOW() \
             WHERE id = $1 AND status = ANY($5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetPack>(&query)
            .bind(id)
            .bind(AssetPackStatus::Completed.as_str())
            .bind(totals.total_layers)
            .bind(totals.total_expressions)
            .bind(source_statuses(AssetPackStatus::Completed))
            .fetch_optional(pool)
            .await
    }
}
