//! Asset layer entity: a decomposed visual layer or an expression variant.

use layerforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `asset_layers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AssetLayer {
    pub id: DbId,
    pub asset_pack_id: DbId,
    pub layer_type: String,
    pub name: String,
    pub file_url: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a layer.
#[derive(Debug, Clone)]
pub struct CreateAssetLayer {
    pub asset_pack_id: DbId,
    pub layer_type: String,
    pub name: String,
    pub file_url: String,
    pub metadata: serde_json::Value,
}
