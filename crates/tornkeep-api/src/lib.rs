//! Read-only HTTP API over the tornkeep store.
//!
//! This crate provides an Axum HTTP server that exposes the Query Gateway
//! as JSON for a browser table viewer:
//!
//! - `GET /api/tables` -- which tables can be queried
//! - `GET /api/query` -- one page of a table, with ordering and a filter
//! - `GET /api/health` -- schema version, row counts, history ages
//!
//! Every request is served from the store's read-only pool. Input errors
//! map to `400`, deadline overruns to `504` and engine failures to `500`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve_until, start_server};
pub use state::AppState;
