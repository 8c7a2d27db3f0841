//! Notifications published by RingShare nodes.
//!
//! Front-ends subscribe through [`PeerNode::subscribe`](crate::node::PeerNode::subscribe)
//! and render these however they like; [`handle_node_event`] just logs them.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, trace, warn};

use crate::liveness::LivenessEvent;
use crate::ring::PeerId;

/// Something a front-end may want to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NodeEvent {
    /// Another node pushed a file here
    FileReceived { filename: String, slot: u32, natural_slot: u32, from: PeerId },

    /// A local upload was stored on this node
    StoredLocally { filename: String, slot: u32, natural_slot: u32, fallback: bool },

    FileDeleted { filename: String, slot: u32 },

    /// A peer flipped between active and inactive
    PeerStatusChanged(LivenessEvent),
}

/// Send `event` to current subscribers; dropped when there are none
pub(crate) fn publish(events: &broadcast::Sender<NodeEvent>, event: NodeEvent) {
    if events.send(event).is_err() {
        trace!("No subscribers for node event");
    }
}

/// Log a node event
pub fn handle_node_event(event: &NodeEvent) {
    match event {
        NodeEvent::FileReceived { filename, slot, natural_slot, from } => {
            if slot != natural_slot {
                info!("Received {filename} from Node {from}, stored at slot {slot} (hashed to {natural_slot})");
            } else {
                info!("Received {filename} from Node {from}, stored at slot {slot}");
            }
        },
        NodeEvent::StoredLocally { filename, slot, fallback, .. } => {
            if *fallback {
                warn!("Successor not active, {filename} kept on this node for now (slot {slot})");
            } else {
                info!("Stored {filename} at slot {slot}");
            }
        },
        NodeEvent::FileDeleted { filename, slot } => {
            info!("Deleted {filename} from slot {slot}");
        },
        NodeEvent::PeerStatusChanged(change) => {
            let state = if change.active { "active" } else { "inactive" };
            info!("Node {} is now {state}", change.peer);
        },
    }
}
