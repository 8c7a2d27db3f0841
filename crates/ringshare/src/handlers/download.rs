//! DOWNLOAD handling: serve a stored file.

use tracing::{debug, warn};

use crate::node::PeerNode;
use crate::protocol::Response;

pub async fn handle_download(node: &PeerNode, filename: &str) -> Response {
    match node.read_local(filename).await {
        Ok(Some(payload)) => {
            debug!(%filename, bytes = payload.len(), "Serving file");
            Response::File { payload }
        },
        Ok(None) => {
            debug!(%filename, "Requested file not stored here");
            Response::NotFound
        },
        Err(e) => {
            warn!(%filename, error = %e, "Failed to serve file");
            Response::Rejected { reason: e.to_string() }
        },
    }
}
