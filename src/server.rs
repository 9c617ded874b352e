use axum::{
    middleware as axum_mw,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::request_log;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Experiment listing ──────────────────────────────────
        .route("/data", get(handlers::experiments::list_experiments))
        // ── Scalars ─────────────────────────────────────────────
        .route(
            "/data/scalars",
            get(handlers::scalars::get_scalars)
                .post(handlers::scalars::post_scalar),
        )
        // ── Histograms ──────────────────────────────────────────
        .route(
            "/data/histograms",
            get(handlers::histograms::get_histograms)
                .post(handlers::histograms::post_histogram),
        )
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        .fallback(handlers::not_found)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(request_log::log_request))
        .layer(CorsLayer::permissive())
}
