//! Error types for the query API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The body
//! is always `{ "error": ..., "status": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tornkeep_db::{DbError, QueryError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The query string could not be decoded.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The Query Gateway rejected or failed the read.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A store-level operation failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_)
            | Self::Query(
                QueryError::UnknownTable(_)
                | QueryError::UnknownColumn { .. }
                | QueryError::InvalidPage(_)
                | QueryError::Malformed { .. }
                | QueryError::TypeMismatch { .. },
            ) => StatusCode::BAD_REQUEST,
            Self::Query(QueryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Query(QueryError::Database(_)) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        let unknown = ApiError::from(QueryError::UnknownTable(String::from("nope")));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(QueryError::InvalidPage(0)).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        assert_eq!(
            ApiError::from(QueryError::Timeout(5_000)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn store_failures_are_server_errors() {
        let err = ApiError::from(DbError::Config(String::from("bad horizon")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
