//! Peer liveness detection.
//!
//! A background task probes every configured peer on a fixed interval and
//! keeps the latest active/inactive snapshot. Only changes between cycles
//! are reported.

pub mod monitor;
pub mod probe;

pub use monitor::{LivenessEvent, LivenessMonitor, LivenessSnapshot};
pub use probe::{ConnectProber, HeartbeatProber, Prober};
