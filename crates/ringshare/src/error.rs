//! Error types for RingShare.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::SearchOutcome;
use crate::ring::PeerId;

/// Errors produced by the ring, storage and transfer layers
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read peer list {}: {source}", .path.display())]
    PeerListUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid peer list line {line}: {reason}")]
    InvalidPeerList { line: usize, reason: String },

    #[error("peer list is empty")]
    EmptyPeerList,

    #[error("local node {0} does not appear in the peer list")]
    UnknownLocalPeer(PeerId),

    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("all {range} hash slots are occupied")]
    CapacityExhausted { range: u32 },

    #[error("slot {slot} is already assigned to {existing:?}")]
    SlotTaken { slot: u32, existing: String },

    #[error("invalid filename {name:?}: {reason}")]
    InvalidFilename { name: String, reason: &'static str },

    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("file {0:?} not found")]
    FileNotFound(String),

    #[error("slot {0} is outside the hash range")]
    InvalidSlot(u32),

    #[error("search for slot {} ended without a file: {:?}", .0.slot, .0.status)]
    SearchFailed(Box<SearchOutcome>),

    #[error("peer at {addr} is unreachable: {source}")]
    PeerUnreachable {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {after:?} talking to {addr}")]
    Timeout { addr: SocketAddr, after: Duration },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("peer {peer} rejected the request: {reason}")]
    Rejected { peer: PeerId, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error only means the remote side could not be reached
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::PeerUnreachable { .. } | Error::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

/// RingShare result type
pub type Result<T> = std::result::Result<T, Error>;
