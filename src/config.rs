//! Relay configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default relay address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8765";

/// Outbound queue size per connection
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Runtime settings shared by every connection task
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// WebSocket listen address
    pub addr: String,
    /// Optional HTTP status listener
    pub status_addr: Option<SocketAddr>,
    /// Envelopes buffered per connection before it counts as too slow (at least 1)
    pub queue_capacity: usize,
    /// Time allowed between accept and the join frame
    pub handshake_timeout: Duration,
    /// Disconnect joined clients silent for this long
    pub idle_timeout: Option<Duration>,
    /// Time the writer gets to flush queued envelopes after leave
    pub drain_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            status_addr: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            handshake_timeout: Duration::from_secs(10),
            idle_timeout: None,
            drain_timeout: Duration::from_secs(2),
        }
    }
}
