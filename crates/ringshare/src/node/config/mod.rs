//! Node configuration for RingShare.
//!
//! This module defines the configuration options for RingShare nodes.

mod methods;
mod types;

pub use types::{NodeConfig, NodeConfigBuilder, ProbeStrategy, DEFAULT_MAX_PAYLOAD};
