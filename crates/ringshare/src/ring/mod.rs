//! Ring membership and routing.
//!
//! This module contains the static peer registry, the filename hashing used
//! to place files on the ring, and owner resolution.

pub mod hash;
pub mod registry;
pub mod router;

pub use hash::{natural_slot, string_hash, Assignment, HashAssigner, HASH_RANGE};
pub use registry::{PeerDescriptor, PeerId, PeerRegistry};
pub use router::RingRouter;
