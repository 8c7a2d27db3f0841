//! Node module for RingShare.
//!
//! This module contains the node state object, its configuration, the
//! connection loop and the notifications it emits to front-ends.

pub mod config;
pub mod core;
pub mod events;
mod getters;

// Re-export main types
pub use config::{NodeConfig, NodeConfigBuilder, ProbeStrategy, DEFAULT_MAX_PAYLOAD};
pub use self::core::{DownloadedFile, PeerNode, UploadReceipt};
pub use events::{handle_node_event, NodeEvent};
