//! Periodic probing of every peer and the active/inactive view built from it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::probe::Prober;
use crate::ring::{PeerId, PeerRegistry};

/// Reachability of every peer as of one probe cycle.
///
/// Peers that have not been observed yet count as active, so routing works
/// before the first cycle completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessSnapshot {
    states: BTreeMap<PeerId, bool>,
    taken_at: Option<DateTime<Utc>>,
}

impl LivenessSnapshot {
    pub fn is_active(&self, peer: PeerId) -> bool {
        self.states.get(&peer).copied().unwrap_or(true)
    }

    /// The observed state, `None` if the peer was never probed
    pub fn observed(&self, peer: PeerId) -> Option<bool> {
        self.states.get(&peer).copied()
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeerId, bool)> + '_ {
        self.states.iter().map(|(peer, active)| (*peer, *active))
    }

    /// One event per peer whose state differs from `previous`
    pub fn changes_since(&self, previous: &LivenessSnapshot) -> Vec<LivenessEvent> {
        self.iter()
            .filter(|(peer, active)| previous.observed(*peer).is_some_and(|was| was != *active))
            .map(|(peer, active)| LivenessEvent { peer, active, at: self.taken_at.unwrap_or_else(Utc::now) })
            .collect()
    }
}

impl FromIterator<(PeerId, bool)> for LivenessSnapshot {
    fn from_iter<I: IntoIterator<Item = (PeerId, bool)>>(iter: I) -> Self {
        Self { states: iter.into_iter().collect(), taken_at: Some(Utc::now()) }
    }
}

/// A peer flipped between active and inactive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessEvent {
    pub peer: PeerId,
    pub active: bool,
    pub at: DateTime<Utc>,
}

/// Periodically probes all registered peers
pub struct LivenessMonitor {
    registry: Arc<PeerRegistry>,
    prober: Arc<dyn Prober>,
    current: RwLock<Option<LivenessSnapshot>>,
}

impl LivenessMonitor {
    pub fn new(registry: Arc<PeerRegistry>, prober: Arc<dyn Prober>) -> Self {
        Self { registry, prober, current: RwLock::new(None) }
    }

    /// Latest snapshot; empty (all peers active) before the first cycle
    pub async fn snapshot(&self) -> LivenessSnapshot {
        self.current.read().await.clone().unwrap_or_default()
    }

    /// Whether at least one cycle has completed
    pub async fn is_primed(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Probe every peer once and replace the snapshot.
    ///
    /// The first cycle only populates the snapshot and returns no events.
    pub async fn probe_cycle(&self) -> Vec<LivenessEvent> {
        let probes = self.registry.iter().map(|peer| {
            let prober = self.prober.clone();
            async move { (peer.id, prober.probe(peer).await) }
        });
        let next: LivenessSnapshot = futures::future::join_all(probes).await.into_iter().collect();

        let mut current = self.current.write().await;
        let events = match current.as_ref() {
            Some(previous) => next.changes_since(previous),
            None => {
                let active = next.iter().filter(|(_, active)| *active).count();
                info!(active, total = self.registry.len(), "Initial liveness snapshot taken");
                Vec::new()
            },
        };
        *current = Some(next);
        events
    }

    /// Run probe cycles every `period` on a background task, handing each
    /// change to `sink`
    pub fn spawn<F>(self: Arc<Self>, period: Duration, sink: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(LivenessEvent) + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                let events = self.probe_cycle().await;
                debug!(changes = events.len(), "Liveness cycle completed");
                for event in events {
                    info!(
                        peer = event.peer,
                        active = event.active,
                        "Peer is now {}",
                        if event.active { "active" } else { "inactive" }
                    );
                    sink(event);
                }
            }
        })
    }
}
