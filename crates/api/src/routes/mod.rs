pub mod asset_packs;
pub mod demo;
pub mod health;
pub mod pipeline_jobs;
pub mod uploads;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                  WebSocket change notifications
///
/// /uploads                             multipart upload (requires auth)
///
/// /asset-packs                         list (merged demo + live)
/// /asset-packs/{id}                    get
/// /asset-packs/{id}/layers             layers of a pack
/// /asset-packs/{id}/process            run the pipeline synchronously (owner, requires auth)
///
/// /pipeline-jobs                       list, optional ?asset_pack_id=
/// /pipeline-jobs/{id}                  get
///
/// /demo/uploads                        start a simulated run
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/uploads", uploads::router())
        .nest("/asset-packs", asset_packs::router())
        .nest("/pipeline-jobs", pipeline_jobs::router())
        .nest("/demo", demo::router())
}
