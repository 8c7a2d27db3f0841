//! Node configuration types for RingShare.
//!
//! This module defines the configuration data structures for RingShare nodes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ring::PeerId;

/// Largest file accepted by default (64 MiB)
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// How liveness probes are performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy {
    /// Plain TCP connect
    #[default]
    Connect,
    /// PING/PONG exchange
    Heartbeat,
}

/// Configuration options for a RingShare node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's id; must appear in the peer list
    pub node_id: PeerId,

    /// Address to bind; defaults to the peer list entry for `node_id`
    pub listen_addr: Option<SocketAddr>,

    /// Directory holding files this node serves
    pub shared_dir: PathBuf,

    /// Directory downloaded files are saved to
    pub downloads_dir: PathBuf,

    /// Time between liveness probe cycles
    pub probe_interval: Duration,

    pub probe_strategy: ProbeStrategy,

    /// Per-connection connect timeout
    pub connect_timeout: Duration,

    /// Per-connection read/write timeout
    pub io_timeout: Duration,

    /// Cumulative budget for a whole forwarded search
    pub search_budget: Duration,

    /// Connections handled concurrently
    pub max_connections: usize,

    pub max_payload_bytes: usize,

    /// Buffered notifications per subscriber
    pub event_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            listen_addr: None,
            shared_dir: PathBuf::from("shared"),
            downloads_dir: PathBuf::from("downloads"),
            probe_interval: Duration::from_secs(5),
            probe_strategy: ProbeStrategy::Connect,
            connect_timeout: Duration::from_secs(3),
            io_timeout: Duration::from_secs(30),
            search_budget: Duration::from_secs(10),
            max_connections: 64,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD,
            event_capacity: 256,
        }
    }
}

impl NodeConfig {
    /// Create a new configuration builder
    pub fn builder(node_id: PeerId) -> NodeConfigBuilder {
        NodeConfigBuilder { config: NodeConfig { node_id, ..NodeConfig::default() } }
    }
}

/// Builder for NodeConfig
#[derive(Debug, Default)]
pub struct NodeConfigBuilder {
    pub(crate) config: NodeConfig,
}
