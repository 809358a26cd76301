use axum::routing::{get, post};
use axum::Router;

use crate::handlers::asset_packs;
use crate::state::AppState;

/// Routes mounted at `/asset-packs`.
///
/// ```text
/// GET    /                -> list_asset_packs
/// GET    /{id}            -> get_asset_pack
/// GET    /{id}/layers     -> list_layers
/// POST   /{id}/process    -> process_asset_pack (requires auth, owner only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(asset_packs::list_asset_packs))
        .route("/{id}", get(asset_packs::get_asset_pack))
        .route("/{id}/layers", get(asset_packs::list_layers))
        .route("/{id}/process", post(asset_packs::process_asset_pack))
}
