//! UPLOAD handling: store a file pushed by another node.

use tracing::{info, warn};

use crate::node::{NodeEvent, PeerNode};
use crate::protocol::Response;
use crate::ring::PeerId;

pub async fn handle_upload(node: &PeerNode, filename: String, sender_id: PeerId, payload: Vec<u8>) -> Response {
    let size = payload.len();

    match node.store_local(&filename, &payload).await {
        Ok(assignment) => {
            info!(
                %filename,
                from = sender_id,
                slot = assignment.slot,
                natural_slot = assignment.natural_slot,
                bytes = size,
                "Stored incoming file"
            );
            node.emit(NodeEvent::FileReceived {
                filename: filename.clone(),
                slot: assignment.slot,
                natural_slot: assignment.natural_slot,
                from: sender_id,
            });
            Response::Stored { filename, slot: assignment.slot, natural_slot: assignment.natural_slot }
        },
        Err(e) => {
            warn!(%filename, from = sender_id, error = %e, "Rejected incoming file");
            Response::Rejected { reason: e.to_string() }
        },
    }
}
