//! Node configuration methods for RingShare.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{NodeConfig, NodeConfigBuilder, ProbeStrategy};
use crate::transport::Timeouts;

impl NodeConfig {
    /// Transport timeouts derived from this configuration
    pub fn timeouts(&self) -> Timeouts {
        Timeouts { connect: self.connect_timeout, io: self.io_timeout }
    }
}

impl NodeConfigBuilder {
    /// Build the configuration
    pub fn build(self) -> NodeConfig {
        self.config
    }

    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = Some(addr);
        self
    }

    pub fn shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.shared_dir = dir.into();
        self
    }

    pub fn downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.downloads_dir = dir.into();
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    pub fn probe_strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.config.probe_strategy = strategy;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    pub fn search_budget(mut self, budget: Duration) -> Self {
        self.config.search_budget = budget;
        self
    }

    /// Bound the number of connections handled at once (at least one)
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max.max(1);
        self
    }

    pub fn max_payload_bytes(mut self, max: usize) -> Self {
        self.config.max_payload_bytes = max;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }
}
