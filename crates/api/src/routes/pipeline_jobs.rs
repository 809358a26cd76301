use axum::routing::get;
use axum::Router;

use crate::handlers::pipeline_jobs;
use crate::state::AppState;

/// Routes mounted at `/pipeline-jobs`.
///
/// ```text
/// GET    /                -> list_jobs (?asset_pack_id=&limit=&offset=&source=)
/// GET    /{id}            -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pipeline_jobs::list_jobs))
        .route("/{id}", get(pipeline_jobs::get_job))
}
