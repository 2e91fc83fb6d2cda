//! REST API endpoint handlers.
//!
//! All handlers read through the store's read-only pool via the shared
//! [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/tables` | Allow-listed tables and their column counts |
//! | `GET` | `/api/query` | One page of a table (`table`, `page`, `limit`, `order_by`, `filter`) |
//! | `GET` | `/api/health` | Schema version, row counts, history ages, file size |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use tornkeep_db::QueryRequest;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /api/tables
// ---------------------------------------------------------------------------

/// List the queryable tables present in the database.
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tables = state.store.gateway(&state.query).list_tables().await?;
    Ok(Json(serde_json::json!({
        "count": tables.len(),
        "tables": tables,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/query
// ---------------------------------------------------------------------------

/// Return one page of rows.
///
/// # Query Parameters
///
/// - `table`: required, one of `/api/tables`
/// - `page`: 1-based (default 1)
/// - `limit` or `page_size`: rows per page, clamped to the configured maximum
/// - `order_by`: `column [ASC|DESC]`
/// - `filter`: `column op value` or `column IS [NOT] NULL`
pub async fn query_table(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryRequest>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(request) = params.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let page = state.store.gateway(&state.query).query(&request).await?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report store health.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state.store.health(state.horizon_days).await?;
    Ok(Json(report))
}
