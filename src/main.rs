//! Termchat Relay - Entry Point
//!
//! Parses flags, starts the optional status endpoint and runs the relay.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use termchat_relay::config::{DEFAULT_ADDR, DEFAULT_QUEUE_CAPACITY};
use termchat_relay::{status, Relay, RelayConfig};

#[derive(Parser, Debug)]
#[command(name = "termchat-relay")]
#[command(about = "Multi-room WebSocket chat relay", long_about = None)]
struct Args {
    /// Address to accept WebSocket connections on
    #[arg(short, long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Address for the read-only HTTP status endpoint (disabled if unset)
    #[arg(long)]
    status_addr: Option<SocketAddr>,

    /// Outbound envelopes buffered per client before it is evicted
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Seconds a new connection has to send its join request
    #[arg(long, default_value_t = 10)]
    handshake_timeout_secs: u64,

    /// Disconnect clients silent for this many seconds
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            status_addr: args.status_addr,
            queue_capacity: args.queue_capacity,
            handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
            idle_timeout: args.idle_timeout_secs.map(Duration::from_secs),
            ..RelayConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=termchat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("termchat_relay=info")),
        )
        .init();

    let config = RelayConfig::from(Args::parse());
    let relay = Relay::new(config);

    if let Some(status_addr) = relay.config().status_addr {
        let registry = relay.registry();
        tokio::spawn(async move {
            if let Err(e) = status::serve(status_addr, registry).await {
                error!("Status endpoint error: {}", e);
            }
        });
    }

    info!("Starting termchat relay");
    relay.run().await?;

    Ok(())
}
