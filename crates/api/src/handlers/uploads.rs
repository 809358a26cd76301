//! Handler for authenticated image uploads.
//!
//! The image is written under `UPLOAD_DIR/{user_id}/` and served back from
//! `/uploads`, so the URL handed to the AI gateway is the public one.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use layerforge_core::error::CoreError;
use layerforge_core::types::{new_id, DbId};
use layerforge_db::models::asset_pack::{AssetPack, CreateAssetPack};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest accepted request body for an upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const DEFAULT_EXTENSION: &str = "png";

/// An image file received in the `file` field.
struct UploadedFile {
    file_name: Option<String>,
    data: Vec<u8>,
}

/// Fields of the multipart form.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    name: Option<String>,
    description: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(CoreError::Validation(format!(
                            "Expected an image upload, got '{content_type}'"
                        ))
                        .into());
                    }
                }
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            "name" => {
                form.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "description" => {
                form.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Lowercase alphanumeric extension of `file_name`, or the default.
fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Name of the pack: the `name` field, else the file stem.
fn pack_name(name: Option<&str>, file_name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            file_name
                .map(|f| f.rsplit_once('.').map_or(f, |(stem, _)| stem))
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
}

async fn store_file(state: &AppState, user_id: DbId, file: &UploadedFile) -> AppResult<String> {
    let relative = format!(
        "{user_id}/{}.{}",
        new_id(),
        file_extension(file.file_name.as_deref())
    );
    let dest = state.config.upload_dir.join(&relative);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    }
    tokio::fs::write(&dest, &file.data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    Ok(format!("{}/uploads/{relative}", state.config.public_base_url))
}

/// POST /api/v1/uploads
///
/// Store the image, create a `pending` pack owned by the caller and start
/// the pipeline in the background. Returns `202` with the pack; progress
/// is observed through the job listing or the WebSocket stream.
pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AssetPack>>)> {
    if !state.orchestrator.is_configured() {
        return Err(CoreError::Configuration("AI_GATEWAY_API_KEY is not configured".into()).into());
    }

    let form = read_form(multipart).await?;
    let file = form
        .file
        .filter(|f| !f.data.is_empty())
        .ok_or_else(|| CoreError::Validation("A non-empty 'file' field is required".into()))?;
    let name = pack_name(form.name.as_deref(), file.file_name.as_deref())
        .ok_or_else(|| CoreError::Validation("A 'name' field is required".into()))?;

    let image_url = store_file(&state, auth.user_id, &file).await?;

    let pack = state
        .tracker
        .create_pack(&CreateAssetPack {
            user_id: Some(auth.user_id),
            name,
            description: form
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            thumbnail_url: Some(image_url.clone()),
            original_image_url: Some(image_url.clone()),
        })
        .await?;

    tracing::info!(
        asset_pack_id = %pack.id,
        user_id = %auth.user_id,
        bytes = file.data.len(),
        "Image uploaded",
    );

    let orchestrator = state.orchestrator.clone();
    let asset_pack_id = pack.id;
    tokio::spawn(async move {
        if let Err(e) = orchestrator.claim_and_run(asset_pack_id, &image_url).await {
            tracing::error!(asset_pack_id = %asset_pack_id, error = %e, "Pipeline run failed");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: pack })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(file_extension(Some("hana.PNG")), "png");
        assert_eq!(file_extension(Some("hana.webp")), "webp");
        assert_eq!(file_extension(Some("no_extension")), DEFAULT_EXTENSION);
        assert_eq!(file_extension(Some("evil.p/ng")), DEFAULT_EXTENSION);
        assert_eq!(file_extension(None), DEFAULT_EXTENSION);
    }

    #[test]
    fn name_falls_back_to_file_stem() {
        assert_eq!(pack_name(Some(" Hana "), Some("x.png")).as_deref(), Some("Hana"));
        assert_eq!(pack_name(Some("  "), Some("hana.png")).as_deref(), Some("hana"));
        assert_eq!(pack_name(None, None), None);
    }
}
