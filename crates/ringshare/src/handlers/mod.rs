//! Protocol handlers for RingShare.
//!
//! This module contains the receiving side of every verb: a node's
//! connection loop decodes a request and hands it to [`handle_request`].

pub mod download;
pub mod forward;
pub mod search;
pub mod upload;
pub mod validation;

use tracing::warn;

use crate::node::PeerNode;
use crate::protocol::{Request, Response};

pub use forward::forward_search;
pub use validation::{validate_filename, validate_payload_size, validate_slot};

/// Dispatch a decoded request to its handler
pub async fn handle_request(node: &PeerNode, request: Request) -> Response {
    match request {
        Request::Upload { filename, sender_id, payload } => {
            upload::handle_upload(node, filename, sender_id, payload).await
        },
        Request::Download { filename } => download::handle_download(node, &filename).await,
        Request::Search { filename } => search::handle_search(node, &filename).await,
        Request::ForwardSearch { request } => {
            if let Err(reason) = forward::check_request(&request) {
                warn!(origin = request.origin, %reason, "Rejecting malformed forwarded search");
                return Response::Rejected { reason };
            }
            let outcome = forward_search(node, request).await;
            Response::SearchResult { outcome }
        },
        Request::Ping => Response::Pong { node_id: node.local().id },
    }
}
