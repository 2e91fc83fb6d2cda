//! Listener setup and the serve loop.
//!
//! [`start_server`] is what the binary runs: bind, serve, stop on `Ctrl-C`.
//! [`serve_until`] takes an already-bound listener and any shutdown future,
//! which is how the tests drive a real socket on an ephemeral port.

use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the query API listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface address, e.g. `0.0.0.0` or `127.0.0.1`.
    pub host: String,
    /// TCP port; `0` picks a free one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Address`] if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|source| ServerError::Address { address, source })
    }
}

/// Bind the configured address and serve until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError`] if the address is invalid, the port cannot be
/// bound, or the serve loop fails.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_until(listener, state, ctrl_c()).await
}

/// Serve the query API on `listener` until `shutdown` resolves, then let
/// in-flight requests finish.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the serve loop fails.
pub async fn serve_until(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!(%addr, "Query API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!(%addr, "Query API stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the only way out is killing the process.
        tracing::warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Listener and serve-loop failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `host:port` does not parse as a socket address.
    #[error("invalid listen address `{address}`: {source}")]
    Address {
        /// The rejected `host:port` text.
        address: String,
        /// Parse failure.
        source: AddrParseError,
    },

    /// The port could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Address tried.
        addr: SocketAddr,
        /// OS error.
        source: std::io::Error,
    },

    /// The serve loop stopped with an I/O error.
    #[error("query API failed: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_all_interfaces() {
        let addr = ServerConfig::default().socket_addr().ok();
        assert_eq!(addr, Some(SocketAddr::from(([0, 0, 0, 0], 5000))));
    }

    #[test]
    fn hostnames_are_rejected() {
        let config = ServerConfig {
            host: String::from("localhost"),
            port: 5000,
        };
        assert!(matches!(
            config.socket_addr(),
            Err(ServerError::Address { ref address, .. }) if address == "localhost:5000"
        ));
    }
}
