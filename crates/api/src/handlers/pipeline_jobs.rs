//! Handlers for the `/pipeline-jobs` resource.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use layerforge_core::error::CoreError;
use layerforge_core::types::DbId;
use layerforge_db::repositories::{clamp_limit, clamp_offset};

use crate::error::{AppError, AppResult};
use crate::query::JobListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pipeline-jobs
///
/// Newest-first, optionally restricted to one asset pack.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListParams>,
) -> AppResult<impl IntoResponse> {
    let jobs = state
        .catalog
        .list_jobs(
            params.source,
            params.asset_pack_id,
            clamp_limit(params.limit),
            clamp_offset(params.offset),
        )
        .await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/pipeline-jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .catalog
        .find_job(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PipelineJob",
            id,
        }))?;
    Ok(Json(DataResponse { data: job }))
}
