//! Owner resolution over the ring.

use std::sync::Arc;

use crate::liveness::LivenessSnapshot;
use crate::ring::{PeerDescriptor, PeerId, PeerRegistry};

/// Resolves which peer owns a hash slot, honouring liveness
#[derive(Debug, Clone)]
pub struct RingRouter {
    registry: Arc<PeerRegistry>,
    local: PeerDescriptor,
}

impl RingRouter {
    pub fn new(registry: Arc<PeerRegistry>, local: PeerDescriptor) -> Self {
        Self { registry, local }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn local(&self) -> &PeerDescriptor {
        &self.local
    }

    /// The first active peer whose id is not less than `slot`, wrapping to the
    /// smallest active id. With no active peer at all the local node answers.
    pub fn resolve_owner(&self, slot: u32, liveness: &LivenessSnapshot) -> &PeerDescriptor {
        let mut active = self.registry.iter().filter(|peer| liveness.is_active(peer.id)).peekable();
        let Some(&smallest) = active.peek() else {
            return &self.local;
        };

        active.find(|peer| peer.id >= slot).unwrap_or(smallest)
    }

    /// Whether the local node owns `slot` under the given liveness view
    pub fn is_local_owner(&self, slot: u32, liveness: &LivenessSnapshot) -> bool {
        self.resolve_owner(slot, liveness).id == self.local.id
    }

    /// Next active peer after `from` in ring order, never `from` itself
    pub fn next_hop(&self, from: PeerId, liveness: &LivenessSnapshot) -> Option<&PeerDescriptor> {
        self.registry.after(from).find(|peer| liveness.is_active(peer.id))
    }

    /// Nearest active peer before `from` in ring order, never `from` itself
    pub fn prev_hop(&self, from: PeerId, liveness: &LivenessSnapshot) -> Option<&PeerDescriptor> {
        self.registry.before(from).find(|peer| liveness.is_active(peer.id))
    }
}
