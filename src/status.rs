//! Read-only HTTP status endpoint
//!
//! Feeds the terminal login form's "users in general chat" badge. Never
//! mutates the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::AppError;
use crate::registry::RoomRegistry;

/// Public room whose head count the login form shows
pub const GENERAL_ROOM: &str = "general";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GeneralCount {
    #[serde(rename = "userCount")]
    pub user_count: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RelayStatus {
    pub rooms: usize,
    pub connections: usize,
}

pub fn router(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/general-count", get(general_count))
        .route("/status", get(status))
        .with_state(registry)
}

/// Serve the status routes on `addr`
pub async fn serve(addr: SocketAddr, registry: Arc<RoomRegistry>) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Status endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

pub async fn general_count(State(registry): State<Arc<RoomRegistry>>) -> Json<GeneralCount> {
    Json(GeneralCount {
        user_count: registry.count_in_rooms_named(GENERAL_ROOM).await,
    })
}

pub async fn status(State(registry): State<Arc<RoomRegistry>>) -> Json<RelayStatus> {
    Json(RelayStatus {
        rooms: registry.room_count().await,
        connections: registry.connection_count().await,
    })
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::client::ConnectionHandle;
    use crate::types::{ClientId, RoomKey};

    #[tokio::test]
    async fn test_counts_reflect_registry() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);
        registry
            .join(
                RoomKey::new(GENERAL_ROOM, ""),
                ConnectionHandle::new(ClientId::new(), "A", tx1),
            )
            .await
            .unwrap();
        registry
            .join(
                RoomKey::new("lobby", "pw"),
                ConnectionHandle::new(ClientId::new(), "B", tx2),
            )
            .await
            .unwrap();

        let Json(count) = general_count(State(registry.clone())).await;
        assert_eq!(count, GeneralCount { user_count: 1 });

        let Json(relay) = status(State(registry)).await;
        assert_eq!(
            relay,
            RelayStatus {
                rooms: 2,
                connections: 2
            }
        );
    }

    #[test]
    fn test_general_count_wire_name() {
        let json = serde_json::to_string(&GeneralCount { user_count: 3 }).unwrap();
        assert_eq!(json, r#"{"userCount":3}"#);
    }
}
