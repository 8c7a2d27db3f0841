//! Loopback cluster used by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ringshare::ring::natural_slot;
use ringshare::{NodeConfig, PeerDescriptor, PeerId, PeerNode, PeerRegistry};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One running node with its own storage directories
pub struct TestNode {
    pub node: Arc<PeerNode>,
    pub addr: SocketAddr,
    server: Option<JoinHandle<ringshare::Result<()>>>,
    _dir: TempDir,
}

impl TestNode {
    pub fn id(&self) -> PeerId {
        self.node.local().id
    }

    /// Stop accepting connections; the port is released once this returns
    pub async fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
            let _ = server.await;
        }
    }

    /// Listen again on the original address
    pub async fn restart(&mut self) {
        self.stop().await;
        let listener = TcpListener::bind(self.addr).await.unwrap();
        self.server = Some(tokio::spawn(self.node.clone().serve(listener)));
    }
}

pub struct Cluster {
    pub nodes: Vec<TestNode>,

    /// Listeners that accept connections through the backlog but never answer
    stalled: Vec<TcpListener>,
}

impl Cluster {
    /// Start one node per id on loopback, all sharing the same peer list
    pub async fn start(ids: &[PeerId]) -> Self {
        Self::start_with(ids, |config| config).await
    }

    pub async fn start_with(ids: &[PeerId], tweak: impl Fn(NodeConfig) -> NodeConfig) -> Self {
        Self::start_stalled(ids, &[], tweak).await
    }

    /// Like [`Cluster::start_with`], but the peers in `stalled` only hold a
    /// listening socket and never reply
    pub async fn start_stalled(
        ids: &[PeerId],
        stalled: &[PeerId],
        tweak: impl Fn(NodeConfig) -> NodeConfig,
    ) -> Self {
        init_tracing();

        let mut listeners = Vec::new();
        for id in ids {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listeners.push((*id, listener));
        }
        let descriptors = listeners
            .iter()
            .map(|(id, listener)| PeerDescriptor::new(*id, listener.local_addr().unwrap()))
            .collect();
        let registry = PeerRegistry::new(descriptors).unwrap();

        let mut nodes = Vec::new();
        let mut silent = Vec::new();
        for (id, listener) in listeners {
            if stalled.contains(&id) {
                silent.push(listener);
                continue;
            }
            let dir = tempfile::tempdir().unwrap();
            let config = NodeConfig::builder(id)
                .shared_dir(dir.path().join("shared"))
                .downloads_dir(dir.path().join("downloads"))
                .connect_timeout(Duration::from_millis(500))
                .io_timeout(Duration::from_secs(5))
                .search_budget(Duration::from_secs(5))
                .probe_interval(Duration::from_millis(100))
                .build();
            let node = Arc::new(PeerNode::new(tweak(config), registry.clone()).unwrap());
            let addr = listener.local_addr().unwrap();
            let server = tokio::spawn(node.clone().serve(listener));
            nodes.push(TestNode { node, addr, server: Some(server), _dir: dir });
        }

        Self { nodes, stalled: silent }
    }

    pub fn node(&self, id: PeerId) -> &Arc<PeerNode> {
        &self.get(id).node
    }

    pub fn get(&self, id: PeerId) -> &TestNode {
        self.nodes.iter().find(|node| node.id() == id).unwrap()
    }

    pub fn get_mut(&mut self, id: PeerId) -> &mut TestNode {
        self.nodes.iter_mut().find(|node| node.id() == id).unwrap()
    }
}

/// A filename whose natural slot lies in `range`
pub fn name_in_slots(range: std::ops::RangeInclusive<u32>) -> String {
    (0..10_000)
        .map(|index| format!("file-{index}.txt"))
        .find(|name| range.contains(&natural_slot(name)))
        .unwrap()
}
