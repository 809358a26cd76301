//! Handler for simulated uploads.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use layerforge_core::error::CoreError;
use layerforge_db::models::asset_pack::AssetPack;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DemoUploadRequest {
    pub name: String,
    pub description: Option<String>,
    /// Reference to a client-side preview of the image; stored verbatim.
    pub preview_url: String,
}

/// POST /api/v1/demo/uploads
///
/// Create a demo pack and its three jobs, then advance them in the
/// background. Returns `202` with the pack as created.
pub async fn start_demo_upload(
    State(state): State<AppState>,
    Json(input): Json<DemoUploadRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AssetPack>>)> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()).into());
    }
    if input.preview_url.trim().is_empty() {
        return Err(CoreError::Validation("preview_url must not be empty".into()).into());
    }

    let run = state
        .demo
        .start(name, input.description.as_deref(), &input.preview_url)
        .await?;
    let pack = run.pack.clone();

    let demo = state.demo.clone();
    tokio::spawn(async move {
        if let Err(e) = demo.run_to_completion(&run).await {
            tracing::error!(asset_pack_id = %run.pack.id, error = %e, "Demo run failed");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: pack })))
}
