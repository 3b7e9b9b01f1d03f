//! Multi-room WebSocket Chat Relay Library
//!
//! A chat relay for terminal clients built with tokio-tungstenite.
//! Clients join a room by presenting a room name and a shared secret;
//! the same pair always lands in the same room, a different secret for
//! the same name gets an isolated room.
//!
//! # Features
//! - Join handshake with per-room unique display names
//! - Room creation on first join, removal when the last member leaves
//! - Real-time chat fan-out within a room
//! - Private commands (`/colour`, `/help`, `/quit`) and the public `/n` banner
//! - Eviction of recipients that cannot keep up
//! - Read-only HTTP status endpoint
//!
//! # Architecture
//! One task per connection, cooperating through shared state:
//! - `RoomRegistry` maps room keys to rooms behind a short-lived map lock
//! - Each `RoomState` serialises its own membership changes and fan-out
//! - Each connection owns a bounded outbound queue drained by a writer
//!   task, so broadcasting never waits on a slow socket
//!
//! # Example
//! ```ignore
//! use termchat_relay::{Relay, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = Relay::new(RelayConfig::default());
//!     relay.run().await.unwrap();
//! }
//! ```

pub mod auth;
pub mod broadcast;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod status;
pub mod types;

// Re-export main types for convenience
pub use auth::{authenticate, Credentials};
pub use client::ConnectionHandle;
pub use command::{dispatch, Command, Flow};
pub use config::RelayConfig;
pub use error::{AppError, AuthError, CommandError, DeliveryError, ProtocolError};
pub use handler::handle_connection;
pub use message::{ClientMessage, Envelope, ErrorCode, JoinRequest, WireMessage};
pub use registry::{Departure, RoomRegistry};
pub use room::RoomState;
pub use server::Relay;
pub use types::{ClientId, RoomKey};
