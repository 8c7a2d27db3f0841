//! RingShare - ring-routed peer-to-peer file sharing
//!
//! A fixed set of nodes, each identified by a numeric id, is arranged on a
//! logical ring. A filename hashes to a slot in `0..HASH_RANGE` and the node
//! with the smallest id not less than that slot owns the file. This library
//! provides the ring membership, routing, forwarded search, transfer protocol
//! and liveness detection; front-ends drive it through [`PeerNode`].

pub mod error;
pub mod handlers;
pub mod liveness;
pub mod node;
pub mod protocol;
pub mod ring;
pub mod storage;
pub mod transport;

// Re-export main types
pub use error::{Error, Result};
pub use liveness::{ConnectProber, HeartbeatProber, LivenessEvent, LivenessMonitor, LivenessSnapshot, Prober};
pub use node::{DownloadedFile, NodeConfig, NodeEvent, PeerNode, ProbeStrategy, UploadReceipt};
pub use protocol::{Request, Response, SearchOutcome, SearchRequest, SearchStatus};
pub use ring::{Assignment, PeerDescriptor, PeerId, PeerRegistry, RingRouter, HASH_RANGE};
pub use storage::{CatalogEntry, FileCatalog, FileStore};
