//! SEARCH handling: direct membership check against the local catalog.

use tracing::debug;

use crate::node::PeerNode;
use crate::protocol::Response;

pub async fn handle_search(node: &PeerNode, filename: &str) -> Response {
    let present = node.has_file(filename).await;
    debug!(%filename, present, "Membership query");
    Response::Membership { present }
}
