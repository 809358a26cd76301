use axum::routing::post;
use axum::Router;

use crate::handlers::demo;
use crate::state::AppState;

/// Routes mounted at `/demo`. Public; nothing here touches the AI gateway.
///
/// ```text
/// POST   /uploads         -> start_demo_upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/uploads", post(demo::start_demo_upload))
}
