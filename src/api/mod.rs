//! HTTP boundary consumed by the rendering surface
//!
//! JSON endpoints for the view model and user actions, plus an SSE stream
//! that pushes a fresh view model on every change.

pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::MapStore;

pub fn create_router(store: MapStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/map", get(handlers::get_map))
        .route("/api/v1/reference-points", get(handlers::get_reference_points))
        .route("/api/v1/reference-points/:state", get(handlers::get_reference_point))
        .route("/api/v1/query", put(handlers::put_query))
        .route("/api/v1/search", post(handlers::post_search))
        .route("/api/v1/view", put(handlers::put_view))
        .route("/api/v1/view/reset", post(handlers::reset_view))
        .route("/api/v1/events", get(handlers::events))
        .with_state(store)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
