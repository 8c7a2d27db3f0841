//! PeerNode struct definition.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::liveness::LivenessMonitor;
use crate::node::config::NodeConfig;
use crate::node::events::NodeEvent;
use crate::ring::{PeerDescriptor, RingRouter};
use crate::storage::{FileCatalog, FileStore};
use crate::transport::Transport;

/// A RingShare network node
///
/// One value holds everything a node needs; several can live in the same
/// process since nothing is global.
pub struct PeerNode {
    /// The node's configuration
    pub(crate) config: NodeConfig,

    /// This node's entry in the peer list
    pub(crate) local: PeerDescriptor,

    pub(crate) router: RingRouter,

    pub(crate) liveness: Arc<LivenessMonitor>,

    /// Files this node serves, keyed by name and slot
    pub(crate) catalog: RwLock<FileCatalog>,

    pub(crate) store: FileStore,

    pub(crate) transport: Transport,

    /// Notifications for front-ends
    pub(crate) events: broadcast::Sender<NodeEvent>,
}
