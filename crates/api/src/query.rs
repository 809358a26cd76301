//! Query parameter types shared by listing handlers.

use layerforge_core::types::DbId;
use layerforge_pipeline::MergePolicy;
use serde::Deserialize;

/// `?limit=&offset=&source=` for asset-pack listings.
///
/// `source` selects a [`MergePolicy`] (`demo_first`, `live_only`,
/// `demo_only`); omitted means the catalog default.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub source: Option<MergePolicy>,
}

/// `?asset_pack_id=&limit=&offset=&source=` for job listings.
#[derive(Debug, Default, Deserialize)]
pub struct JobListParams {
    pub asset_pack_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub source: Option<MergePolicy>,
}
