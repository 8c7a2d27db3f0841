//! Client-side operations a node performs against the ring.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use super::peer_node::PeerNode;
use crate::error::{Error, Result};
use crate::handlers::{forward_search, validate_filename, validate_payload_size, validate_slot};
use crate::liveness::LivenessSnapshot;
use crate::node::events::NodeEvent;
use crate::protocol::{Request, Response, SearchOutcome, SearchRequest};
use crate::ring::{natural_slot, PeerDescriptor, PeerId};

/// Where an uploaded file ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub filename: String,
    /// Slot assigned by the storing node
    pub slot: u32,
    pub natural_slot: u32,
    /// Node that stored the file
    pub stored_at: PeerId,
    /// Stored here because the natural owner was inactive
    pub fallback: bool,
}

impl UploadReceipt {
    pub fn is_relocated(&self) -> bool {
        self.slot != self.natural_slot
    }
}

/// A file fetched from another node into the downloads directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub from: PeerId,
}

impl PeerNode {
    /// Upload a file from disk under its base name
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<UploadReceipt> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidFilename { name: path.display().to_string(), reason: "no usable file name" })?
            .to_string();
        let payload = fs::read(path).await?;
        self.upload_bytes(&filename, payload).await
    }

    /// Route `payload` to the node owning the name's natural slot.
    ///
    /// When that owner is this node the file is stored locally; `fallback` is
    /// set if this node only owns it because the natural owner is inactive.
    pub async fn upload_bytes(&self, filename: &str, payload: Vec<u8>) -> Result<UploadReceipt> {
        validate_filename(filename)?;
        validate_payload_size(payload.len(), self.config.max_payload_bytes)?;

        let natural = natural_slot(filename);
        let liveness = self.liveness.snapshot().await;
        let owner = *self.router.resolve_owner(natural, &liveness);

        if owner.id == self.local.id {
            let fallback = self.router.resolve_owner(natural, &LivenessSnapshot::default()).id != self.local.id;
            let assignment = self.store_local(filename, &payload).await?;
            if fallback {
                warn!(%filename, natural_slot = natural, "Natural owner inactive, storing on this node for now");
            }
            info!(%filename, slot = assignment.slot, natural_slot = natural, "Stored file locally");
            self.emit(NodeEvent::StoredLocally {
                filename: filename.to_string(),
                slot: assignment.slot,
                natural_slot: assignment.natural_slot,
                fallback,
            });
            return Ok(UploadReceipt {
                filename: filename.to_string(),
                slot: assignment.slot,
                natural_slot: assignment.natural_slot,
                stored_at: self.local.id,
                fallback,
            });
        }

        info!(%filename, natural_slot = natural, target = owner.id, bytes = payload.len(), "Uploading file");
        let request = Request::Upload { filename: filename.to_string(), sender_id: self.local.id, payload };
        match self.transport.exchange(owner.addr, &request).await? {
            Response::Stored { filename, slot, natural_slot } => {
                Ok(UploadReceipt { filename, slot, natural_slot, stored_at: owner.id, fallback: false })
            },
            Response::Rejected { reason } => Err(Error::Rejected { peer: owner.id, reason }),
            other => Err(unexpected(&owner, other)),
        }
    }

    /// Walk the ring for `slot`, starting at this node
    pub async fn search(&self, slot: u32) -> Result<SearchOutcome> {
        validate_slot(slot)?;
        let request = SearchRequest::new(slot, self.local.id, self.config.search_budget.as_millis() as u64);

        let outcome = forward_search(self, request).await;
        info!(slot, status = ?outcome.status, hops = outcome.hops, "Search finished");
        Ok(outcome)
    }

    /// Find the file stored under `slot` and fetch it from the node that
    /// resolved the search
    pub async fn download(&self, slot: u32) -> Result<DownloadedFile> {
        let outcome = self.search(slot).await?;
        let (Some(filename), Some(owner)) = (outcome.filename().map(str::to_string), outcome.resolved_by) else {
            return Err(Error::SearchFailed(Box::new(outcome)));
        };
        self.download_from(owner, &filename).await
    }

    /// Fetch `filename` directly from `peer`
    pub async fn download_from(&self, peer: PeerId, filename: &str) -> Result<DownloadedFile> {
        validate_filename(filename)?;

        let payload = if peer == self.local.id {
            self.read_local(filename).await?
        } else {
            let target = self.peer(peer)?;
            match self.transport.exchange(target.addr, &Request::Download { filename: filename.to_string() }).await? {
                Response::File { payload } => Some(payload),
                Response::NotFound => None,
                Response::Rejected { reason } => return Err(Error::Rejected { peer, reason }),
                other => return Err(unexpected(&target, other)),
            }
        };
        let payload = payload.ok_or_else(|| Error::FileNotFound(filename.to_string()))?;

        let path = self.store.write_download(filename, &payload).await?;
        info!(%filename, from = peer, bytes = payload.len(), path = %path.display(), "Downloaded file");
        Ok(DownloadedFile { filename: filename.to_string(), path, bytes: payload.len(), from: peer })
    }

    /// Ask `peer` whether it stores `filename`
    pub async fn query_peer(&self, peer: PeerId, filename: &str) -> Result<bool> {
        if peer == self.local.id {
            return Ok(self.has_file(filename).await);
        }
        let target = self.peer(peer)?;
        match self.transport.exchange(target.addr, &Request::Search { filename: filename.to_string() }).await? {
            Response::Membership { present } => Ok(present),
            Response::Rejected { reason } => Err(Error::Rejected { peer, reason }),
            other => Err(unexpected(&target, other)),
        }
    }

    fn peer(&self, id: PeerId) -> Result<PeerDescriptor> {
        self.router.registry().get(id).copied().ok_or(Error::UnknownPeer(id))
    }
}

fn unexpected(peer: &PeerDescriptor, response: Response) -> Error {
    Error::Protocol(format!("unexpected {} reply from {peer}", response.status()))
}
