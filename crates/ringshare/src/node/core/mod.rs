//! Main RingShare node implementation.
//!
//! This module contains the core PeerNode struct, its client operations and
//! the connection loop.

mod client;
mod node_methods;
mod peer_node;
mod run;

pub use client::{DownloadedFile, UploadReceipt};
pub use peer_node::PeerNode;
