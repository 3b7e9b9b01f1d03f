//! Relay accept loop
//!
//! Owns the process-wide room registry and spawns one task per accepted
//! connection. There is no central actor: connection tasks cooperate
//! through the registry and per-room locks.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::RoomRegistry;

/// The relay process core
#[derive(Debug, Clone)]
pub struct Relay {
    registry: Arc<RoomRegistry>,
    config: Arc<RelayConfig>,
}

impl Relay {
    /// Create a relay with an empty registry
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Shared registry (read-only observers such as the status endpoint)
    pub fn registry(&self) -> Arc<RoomRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Bind the configured address and serve forever
    pub async fn run(self) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Relay listening on {}", listener.local_addr()?);
        self.serve(listener).await;
        Ok(())
    }

    /// Accept connections from an already bound listener
    pub async fn serve(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let registry = self.registry.clone();
                    let config = self.config.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, config).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
