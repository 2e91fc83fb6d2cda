//! Axum router construction for the query API.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/tables` -- queryable tables
/// - `GET /api/query` -- paginated table read
/// - `GET /api/health` -- store health
///
/// Only `GET` is routed; the API has no write surface. CORS allows any
/// origin so a browser viewer served elsewhere can call it.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tables", get(handlers::list_tables))
        .route("/api/query", get(handlers::query_table))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
