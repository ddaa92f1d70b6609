//! Feed server entry point
//!
//! Binds the listener and serves the router until shut down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::Result;
use crate::registry::{RegistryConfig, TopicRegistry};
use crate::server::config::ServerConfig;
use crate::server::routes::{self, AppState};

/// Live broadcast server
pub struct FeedServer {
    config: Arc<ServerConfig>,
    registry: Arc<TopicRegistry>,
}

impl FeedServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(TopicRegistry::with_config(registry_config)),
        }
    }

    /// Get a reference to the topic registry
    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Feed server listening");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run the server with graceful shutdown
    ///
    /// Open viewer connections are not waited for; their driver tasks notice
    /// the closed sockets and tear themselves down.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Feed server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    fn router(&self) -> axum::Router {
        routes::router(AppState {
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_accessors() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let server = FeedServer::new(ServerConfig::with_addr(addr));

        assert_eq!(server.bind_addr(), addr);
        assert_eq!(server.registry().config().history_limit, 20);
    }

    #[test]
    fn test_custom_registry_config() {
        let server = FeedServer::with_registry_config(
            ServerConfig::default(),
            RegistryConfig::default()
                .history_limit(3)
                .ping_rate(Duration::from_millis(100)),
        );

        assert_eq!(server.registry().config().history_limit, 3);
        assert_eq!(
            server.registry().config().ping_rate,
            Duration::from_millis(100)
        );
    }
}
