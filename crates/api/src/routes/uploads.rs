use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::uploads::{self, MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Routes mounted at `/uploads`. Requires authentication.
///
/// ```text
/// POST   /                -> upload_image (multipart: file, name, description?)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(uploads::upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
