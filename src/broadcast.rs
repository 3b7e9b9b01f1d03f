//! Envelope fan-out
//!
//! Delivery only enqueues onto each recipient's bounded outbound queue, so
//! a slow or dead recipient never blocks the others. Failed recipients are
//! marked for disconnection and otherwise skipped.

use tracing::{debug, warn};

use crate::client::ConnectionHandle;
use crate::message::Envelope;
use crate::room::RoomState;
use crate::types::ClientId;

/// Deliver an envelope to every current member of the room except `exclude`
///
/// Enqueueing happens under the room's membership lock, which keeps
/// per-sender order and never reaches connections that already left.
/// Returns the number of members the envelope was queued for.
pub async fn broadcast(room: &RoomState, envelope: &Envelope, exclude: Option<ClientId>) -> usize {
    let members = room.lock_members().await;
    let mut delivered = 0;

    for handle in members.values() {
        if Some(handle.id) == exclude {
            continue;
        }
        if enqueue(handle, envelope.clone()) {
            delivered += 1;
        }
    }

    debug!(
        "Broadcast in room {} reached {}/{} members",
        room.key,
        delivered,
        members.len()
    );
    delivered
}

/// Deliver an envelope to a single connection
pub fn send_to(handle: &ConnectionHandle, envelope: Envelope) -> bool {
    enqueue(handle, envelope)
}

fn enqueue(handle: &ConnectionHandle, envelope: Envelope) -> bool {
    match handle.deliver(envelope) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Delivery to {} ({}) failed: {}, scheduling disconnect",
                handle.id, handle.username, e
            );
            false
        }
    }
}
