//! Router composition: request logging, optional CORS, and the three
//! routes plus a catch-all 404, matching
//! `original_source/cmd/gravad/main.go`'s route table.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{cors, handlers, AppState};

/// CORS, when enabled, wraps the whole router so its OPTIONS
/// short-circuit (see `cors::layer`) runs ahead of route matching and
/// needs no per-route OPTIONS handler.
pub fn build_router(state: Arc<AppState>, cors_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/status", get(handlers::status_handler))
        .route("/:name/:z/:x/:y/tile.mvt", get(handlers::tile_handler))
        .route("/fonts/:font/:file", get(handlers::font_handler))
        .fallback(handlers::not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router = router.layer(middleware::from_fn(cors::layer));
    }

    router
}
