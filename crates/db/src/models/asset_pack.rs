//! Asset pack entity: one per uploaded character image.

use layerforge_core::status::AssetPackStatus;
use layerforge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `asset_packs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AssetPack {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_image_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AssetPackStatus,
    pub total_layers: i32,
    pub total_expressions: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new asset pack. Packs always start `pending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssetPack {
    pub user_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_image_url: Option<String>,
}

/// Layer counts written onto a pack when the pipeline completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssetPackTotals {
    pub total_layers: i32,
    pub total_expressions: i32,
}
