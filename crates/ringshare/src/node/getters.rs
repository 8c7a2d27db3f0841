//! Accessors on PeerNode.

use std::sync::Arc;

use crate::liveness::LivenessMonitor;
use crate::node::config::NodeConfig;
use crate::node::core::PeerNode;
use crate::ring::{PeerDescriptor, RingRouter};
use crate::storage::FileStore;
use crate::transport::Transport;

impl PeerNode {
    /// Get this node's peer list entry
    pub fn local(&self) -> &PeerDescriptor {
        &self.local
    }

    /// Get the configuration of this node
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn router(&self) -> &RingRouter {
        &self.router
    }

    pub fn liveness(&self) -> &Arc<LivenessMonitor> {
        &self.liveness
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }
}
