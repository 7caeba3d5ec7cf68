//! Listener setup and the top-level router

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use super::routes::{api_routes, AppState};
use super::{DEFAULT_BIND, DEFAULT_PORT, DEFAULT_UPLOAD_LIMIT};
use crate::document::DocumentProcessor;

/// Where to listen and how much to accept per upload
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Host name or IP address
    pub bind: String,
    /// Bytes
    pub upload_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    #[must_use]
    pub fn with_bind(self, bind: impl Into<String>) -> Self {
        Self {
            bind: bind.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_upload_limit(self, upload_limit: usize) -> Self {
        Self {
            upload_limit,
            ..self
        }
    }

    /// First address `bind:port` resolves to; host names are looked up
    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        (self.bind.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{} did not resolve to an address", self.bind),
                )
            })
    }
}

pub struct WebServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default(), DocumentProcessor::default())
    }

    pub fn with_config(config: ServerConfig, processor: DocumentProcessor) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(processor)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Routes with the upload limit applied to every request body
    pub fn router(&self) -> Router {
        api_routes()
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.upload_limit))
            .with_state(self.state.clone())
    }

    /// Serve until Ctrl-C, letting in-flight uploads finish
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!(%addr, upload_limit = self.config.upload_limit, "Starting server");
        println!("Listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

impl Default for WebServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_from_ip() {
        let addr = ServerConfig::default()
            .with_bind("0.0.0.0")
            .with_port(3000)
            .socket_addr()
            .unwrap();
        assert_eq!(addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_socket_addr_from_host_name() {
        let addr = ServerConfig::default()
            .with_bind("localhost")
            .socket_addr()
            .unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_socket_addr_rejects_garbage() {
        let config = ServerConfig::default().with_bind("not a host!");
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_builders_leave_other_fields_alone() {
        let config = ServerConfig::default().with_upload_limit(1024);
        assert_eq!(config.upload_limit, 1024);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind, DEFAULT_BIND);

        let server = WebServer::with_config(config, DocumentProcessor::default());
        assert_eq!(server.config().upload_limit, 1024);
    }
}
