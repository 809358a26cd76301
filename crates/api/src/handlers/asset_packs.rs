//! Handlers for the `/asset-packs` resource.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use layerforge_core::error::CoreError;
use layerforge_core::types::DbId;
use layerforge_db::repositories::{clamp_limit, clamp_offset};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/asset-packs
///
/// Demo packs first, then stored packs, each newest-first.
pub async fn list_asset_packs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let packs = state
        .catalog
        .list_asset_packs(
            params.source,
            clamp_limit(params.limit),
            clamp_offset(params.offset),
        )
        .await?;
    Ok(Json(DataResponse { data: packs }))
}

/// GET /api/v1/asset-packs/{id}
pub async fn get_asset_pack(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pack = state
        .catalog
        .find_asset_pack(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AssetPack",
            id,
        }))?;
    Ok(Json(DataResponse { data: pack }))
}

/// GET /api/v1/asset-packs/{id}/layers
pub async fn list_layers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if state.catalog.find_asset_pack(id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "AssetPack",
            id,
        }));
    }
    let layers = state.catalog.list_layers(id).await?;
    Ok(Json(DataResponse { data: layers }))
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub asset_pack_id: DbId,
    pub total_layers: i32,
    pub total_expressions: i32,
}

/// POST /api/v1/asset-packs/{id}/process
///
/// Run all three stages for a stored `pending` pack owned by the caller and
/// answer once they finish. A pack that is already running or finished is a
/// `409`. Any stage failure is returned as the error payload; the pack and
/// the failing job are left `failed`.
pub async fn process_asset_pack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ProcessRequest>,
) -> AppResult<impl IntoResponse> {
    if !state.orchestrator.is_configured() {
        return Err(CoreError::Configuration("AI_GATEWAY_API_KEY is not configured".into()).into());
    }

    let pack = state
        .store
        .find_asset_pack(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "AssetPack",
            id,
        }))?;
    if pack.user_id != Some(auth.user_id) {
        return Err(CoreError::Forbidden(format!("AssetPack {id} belongs to another user")).into());
    }

    tracing::info!(asset_pack_id = %id, user_id = %auth.user_id, "Processing requested");
    let report = state.orchestrator.claim_and_run(id, &input.image_url).await?;

    Ok(Json(ProcessResponse {
        success: true,
        asset_pack_id: report.asset_pack_id,
        total_layers: report.totals.total_layers,
        total_expressions: report.totals.total_expressions,
    }))
}
