//! Static peer registry.
//!
//! The peer list is loaded once at startup from `id,ip,port` lines and never
//! changes afterwards. Descriptors are kept sorted by id, which is the ring
//! order.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Ring position of a peer
pub type PeerId = u32;

/// A configured peer: its ring id and where to reach it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerDescriptor {
    pub id: PeerId,
    pub addr: SocketAddr,
}

impl PeerDescriptor {
    pub fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self { id, addr }
    }
}

impl fmt::Display for PeerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {} ({})", self.id, self.addr)
    }
}

/// Immutable, id-ordered list of peers
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    peers: Vec<PeerDescriptor>,
}

impl PeerRegistry {
    /// Build a registry from descriptors, sorting them into ring order
    pub fn new(mut peers: Vec<PeerDescriptor>) -> Result<Self> {
        if peers.is_empty() {
            return Err(Error::EmptyPeerList);
        }
        peers.sort_by_key(|peer| peer.id);
        if let Some(pair) = peers.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(Error::InvalidPeerList {
                line: 0,
                reason: format!("duplicate peer id {}", pair[0].id),
            });
        }
        Ok(Self { peers })
    }

    /// Load the peer list file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| Error::PeerListUnreadable { path: path.to_path_buf(), source })?;
        let registry: Self = contents.parse()?;
        info!(path = %path.display(), peers = registry.len(), "Loaded peer list");
        Ok(registry)
    }

    /// Look up a peer by id
    pub fn get(&self, id: PeerId) -> Option<&PeerDescriptor> {
        self.peers.binary_search_by_key(&id, |peer| peer.id).ok().map(|index| &self.peers[index])
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.get(id).is_some()
    }

    /// Peers in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &PeerDescriptor> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers starting right after `id` and wrapping around, excluding `id` itself
    pub fn after(&self, id: PeerId) -> impl Iterator<Item = &PeerDescriptor> {
        let start = self.peers.partition_point(|peer| peer.id <= id);
        self.peers[start..].iter().chain(self.peers[..start].iter()).filter(move |peer| peer.id != id)
    }

    /// Peers ending right before `id` in reverse ring order, excluding `id` itself
    pub fn before(&self, id: PeerId) -> impl Iterator<Item = &PeerDescriptor> {
        let end = self.peers.partition_point(|peer| peer.id < id);
        self.peers[..end].iter().rev().chain(self.peers[end..].iter().rev()).filter(move |peer| peer.id != id)
    }
}

impl FromStr for PeerRegistry {
    type Err = Error;

    fn from_str(contents: &str) -> Result<Self> {
        let mut peers = Vec::new();

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let peer = parse_line(line).map_err(|reason| Error::InvalidPeerList { line: index + 1, reason })?;
            if peers.iter().any(|known: &PeerDescriptor| known.id == peer.id) {
                return Err(Error::InvalidPeerList {
                    line: index + 1,
                    reason: format!("duplicate peer id {}", peer.id),
                });
            }
            peers.push(peer);
        }

        Self::new(peers)
    }
}

fn parse_line(line: &str) -> std::result::Result<PeerDescriptor, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [id, ip, port] = fields.as_slice() else {
        return Err(format!("expected `id,ip,port`, got {} field(s)", fields.len()));
    };

    let id: PeerId = id.parse().map_err(|e| format!("bad id {id:?}: {e}"))?;
    let ip: IpAddr = ip.parse().map_err(|e| format!("bad ip {ip:?}: {e}"))?;
    let port: u16 = port.parse().map_err(|e| format!("bad port {port:?}: {e}"))?;

    Ok(PeerDescriptor::new(id, SocketAddr::new(ip, port)))
}
