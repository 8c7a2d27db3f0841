//! Reachability checks used by the liveness monitor.
//!
//! [`ConnectProber`] only opens a TCP connection; [`HeartbeatProber`] also
//! expects a `PONG` reply to a `PING` frame.

use std::time::Duration;

use tokio::time::timeout;
use tracing::trace;

use crate::protocol::{Request, Response};
use crate::ring::PeerDescriptor;
use crate::transport::Transport;

/// Checker trait for peer reachability
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Whether `peer` is reachable right now
    async fn probe(&self, peer: &PeerDescriptor) -> bool;
}

/// Raw TCP connect probe
pub struct ConnectProber {
    timeout_duration: Duration,
}

impl ConnectProber {
    pub fn new(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }
}

#[async_trait::async_trait]
impl Prober for ConnectProber {
    async fn probe(&self, peer: &PeerDescriptor) -> bool {
        let connect = tokio::net::TcpStream::connect(peer.addr);

        match timeout(self.timeout_duration, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!(peer = peer.id, error = %e, "Connect probe failed");
                false
            },
            Err(_) => {
                trace!(peer = peer.id, "Connect probe timed out");
                false
            },
        }
    }
}

/// Application-level probe: sends PING and expects a PONG from the right node
pub struct HeartbeatProber {
    transport: Transport,
}

impl HeartbeatProber {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl Prober for HeartbeatProber {
    async fn probe(&self, peer: &PeerDescriptor) -> bool {
        match self.transport.exchange(peer.addr, &Request::Ping).await {
            Ok(Response::Pong { node_id }) => node_id == peer.id,
            Ok(other) => {
                trace!(peer = peer.id, response = ?other, "Unexpected heartbeat reply");
                false
            },
            Err(e) => {
                trace!(peer = peer.id, error = %e, "Heartbeat failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_probe_sees_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let peer = PeerDescriptor::new(1, listener.local_addr().unwrap());
        let prober = ConnectProber::new(Duration::from_secs(1));

        assert!(prober.probe(&peer).await);

        drop(listener);
        assert!(!prober.probe(&peer).await);
    }
}
