//! PeerNode construction and local state operations.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use super::peer_node::PeerNode;
use crate::error::{Error, Result};
use crate::handlers::validate_payload_size;
use crate::liveness::{ConnectProber, HeartbeatProber, LivenessMonitor, Prober};
use crate::node::config::{NodeConfig, ProbeStrategy};
use crate::node::events::{publish, NodeEvent};
use crate::ring::{Assignment, HashAssigner, PeerDescriptor, PeerRegistry, RingRouter};
use crate::storage::{CatalogEntry, FileCatalog, FileStore};
use crate::transport::Transport;

impl PeerNode {
    /// Create a node, probing peers with the configured strategy.
    ///
    /// Fails if `config.node_id` is not in `registry`.
    pub fn new(config: NodeConfig, registry: PeerRegistry) -> Result<Self> {
        let transport = Transport::new(config.timeouts(), config.max_payload_bytes);
        let prober: Arc<dyn Prober> = match config.probe_strategy {
            ProbeStrategy::Connect => Arc::new(ConnectProber::new(config.connect_timeout)),
            ProbeStrategy::Heartbeat => Arc::new(HeartbeatProber::new(transport)),
        };
        Self::with_prober(config, registry, prober)
    }

    /// Create a node with a caller-supplied liveness prober
    pub fn with_prober(config: NodeConfig, registry: PeerRegistry, prober: Arc<dyn Prober>) -> Result<Self> {
        let local = *registry.get(config.node_id).ok_or(Error::UnknownLocalPeer(config.node_id))?;
        let registry = Arc::new(registry);

        let router = RingRouter::new(registry.clone(), local);
        let liveness = Arc::new(LivenessMonitor::new(registry.clone(), prober));
        let store = FileStore::new(&config.shared_dir, &config.downloads_dir);
        let transport = Transport::new(config.timeouts(), config.max_payload_bytes);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        info!(node = local.id, addr = %local.addr, peers = registry.len(), "Created node");

        Ok(Self {
            config,
            local,
            router,
            liveness,
            catalog: RwLock::new(FileCatalog::new()),
            store,
            transport,
            events,
        })
    }

    /// Assign a slot for `filename` and write it to the shared directory.
    ///
    /// The catalog write lock is held across assignment, write and insert so
    /// concurrent stores at this node never pick the same slot.
    pub async fn store_local(&self, filename: &str, payload: &[u8]) -> Result<Assignment> {
        validate_payload_size(payload.len(), self.config.max_payload_bytes)?;

        let mut catalog = self.catalog.write().await;
        let assignment = HashAssigner::assign(&catalog, filename)?;
        self.store.write_shared(filename, payload).await?;
        catalog.insert(filename, assignment.slot)?;

        debug!(%filename, slot = assignment.slot, relocated = assignment.is_relocated(), "Catalogued file");
        Ok(assignment)
    }

    /// Content of a catalogued file; `None` if this node does not serve it
    pub async fn read_local(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let catalog = self.catalog.read().await;
        if !catalog.contains(filename) {
            return Ok(None);
        }
        self.store.read_shared(filename).await
    }

    pub async fn has_file(&self, filename: &str) -> bool {
        self.catalog.read().await.contains(filename)
    }

    /// Name of the file stored under `slot`, if any
    pub async fn file_at(&self, slot: u32) -> Option<String> {
        self.catalog.read().await.file_at(slot).map(str::to_string)
    }

    /// Remove a file from the shared directory and then from the catalog.
    /// A failed disk removal leaves the entry in place.
    pub async fn delete(&self, filename: &str) -> Result<u32> {
        let mut catalog = self.catalog.write().await;
        let slot = catalog.slot_of(filename).ok_or_else(|| Error::FileNotFound(filename.to_string()))?;
        let removed = self.store.remove_shared(filename).await?;
        catalog.remove(filename);
        drop(catalog);

        info!(%filename, slot, removed, "Deleted file");
        self.emit(NodeEvent::FileDeleted { filename: filename.to_string(), slot });
        Ok(slot)
    }

    /// Catalogued files in slot order
    pub async fn local_files(&self) -> Vec<CatalogEntry> {
        self.catalog.read().await.entries()
    }

    /// Every peer with its current liveness; unobserved peers count as active
    pub async fn peer_statuses(&self) -> Vec<(PeerDescriptor, bool)> {
        let snapshot = self.liveness.snapshot().await;
        self.router.registry().iter().map(|peer| (*peer, snapshot.is_active(peer.id))).collect()
    }

    /// Subscribe to node notifications
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Publish a notification; dropped when nobody is subscribed
    pub fn emit(&self, event: NodeEvent) {
        publish(&self.events, event);
    }
}
