//! Shared application state for the query API.

use tornkeep_db::{QueryConfig, Store};

/// State shared by every handler.
///
/// The store handle is cheap to clone and every read goes through its
/// read-only pool, so handlers never contend with the writer.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Open store.
    pub store: Store,
    /// Page size, text length and deadline limits for `/api/query`.
    pub query: QueryConfig,
    /// Retention horizon reported by `/api/health`.
    pub horizon_days: i64,
}

impl AppState {
    /// Bundle an open store with its query limits and retention horizon.
    pub const fn new(store: Store, query: QueryConfig, horizon_days: i64) -> Self {
        Self {
            store,
            query,
            horizon_days,
        }
    }
}
