//! Repository for the `asset_layers` table. Layers are insert-only.

use layerforge_core::layers::EXPRESSION_LAYER_TYPE;
use layerforge_core::types::{new_id, DbId};
use sqlx::PgPool;

use crate::models::asset_layer::{AssetLayer, CreateAssetLayer};
use crate::models::asset_pack::AssetPackTotals;

/// Column list for `asset_layers` queries.
const COLUMNS: &str = "id, asset_pack_id, layer_type, name, file_url, metadata, created_at";

pub struct AssetLayerRepo;

impl AssetLayerRepo {
    pub async fn create(pool: &PgPool, input: &CreateAssetLayer) -> Result<AssetLayer, sqlx::Error> {
        let query = format!(
            "INSERT INTO asset_layers (id, asset_pack_id, layer_type, name, file_url, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetLayer>(&query)
            .bind(new_id())
            .bind(input.asset_pack_id)
            .bind(&input.layer_type)
            .bind(&input.name)
            .bind(&input.file_url)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// All layers of a pack in insertion order.
    pub async fn list_by_pack(pool: &PgPool, asset_pack_id: DbId) -> Result<Vec<AssetLayer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM asset_layers \
             WHERE asset_pack_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AssetLayer>(&query)
            .bind(asset_pack_id)
            .fetch_all(pool)
            .await
    }

    /// Count decomposition layers and expression layers of a pack.
    pub async fn count_by_kind(pool: &PgPool, asset_pack_id: DbId) -> Result<AssetPackTotals, sqlx::Error> {
        let (layers, expressions): (i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE layer_type <> $2), \
                 COUNT(*) FILTER (WHERE layer_type = $2) \
             FROM asset_layers WHERE asset_pack_id = $1",
        )
        .bind(asset_pack_id)
        .bind(EXPRESSION_LAYER_TYPE)
        .fetch_one(pool)
        .await?;

        Ok(AssetPackTotals {
            total_layers: i32::try_from(layers).unwrap_or(i32::MAX),
            total_expressions: i32::try_from(expressions).unwrap_or(i32::MAX),
        })
    }
}
