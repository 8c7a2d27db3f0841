//! Protocol type definitions for RingShare.
//!
//! This module defines the data structures exchanged between nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ring::PeerId;

/// A request sent to a node. The `verb` tag selects the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Store `payload` under `filename` on the receiving node
    Upload {
        filename: String,
        sender_id: PeerId,
        #[serde(with = "payload")]
        payload: Vec<u8>,
    },

    /// Fetch a stored file by name
    Download { filename: String },

    /// Ask whether the receiving node stores `filename`
    Search { filename: String },

    /// One hop of a forwarded slot search
    ForwardSearch { request: SearchRequest },

    /// Heartbeat used by liveness probing
    Ping,
}

impl Request {
    pub fn verb(&self) -> &'static str {
        match self {
            Request::Upload { .. } => "UPLOAD",
            Request::Download { .. } => "DOWNLOAD",
            Request::Search { .. } => "SEARCH",
            Request::ForwardSearch { .. } => "FORWARD_SEARCH",
            Request::Ping => "PING",
        }
    }
}

/// A node's reply on the same connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Upload accepted; `slot` may differ from `natural_slot` after probing
    Stored { filename: String, slot: u32, natural_slot: u32 },

    /// Request understood but refused
    Rejected { reason: String },

    /// Download hit
    File {
        #[serde(with = "payload")]
        payload: Vec<u8>,
    },

    /// Download miss
    NotFound,

    /// Answer to a direct SEARCH
    Membership { present: bool },

    /// Terminal result of a forwarded search
    SearchResult { outcome: SearchOutcome },

    Pong { node_id: PeerId },
}

impl Response {
    /// The status tag, for logs that should not dump payloads
    pub fn status(&self) -> &'static str {
        match self {
            Response::Stored { .. } => "STORED",
            Response::Rejected { .. } => "REJECTED",
            Response::File { .. } => "FILE",
            Response::NotFound => "NOT_FOUND",
            Response::Membership { .. } => "MEMBERSHIP",
            Response::SearchResult { .. } => "SEARCH_RESULT",
            Response::Pong { .. } => "PONG",
        }
    }
}

/// A slot search travelling around the ring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub slot: u32,

    /// Node the search started from
    pub origin: PeerId,

    /// Forwards so far; starts at 0
    pub hops: u32,

    /// Every node that forwarded this request, in order. Always `hops` long.
    pub route: Vec<PeerId>,

    /// Time left for the rest of the chain, in milliseconds
    pub budget_ms: u64,

    /// Set when the owner missed and handed the search back to its
    /// predecessor, which then only consults its own catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handed_back_by: Option<PeerId>,
}

impl SearchRequest {
    pub fn new(slot: u32, origin: PeerId, budget_ms: u64) -> Self {
        Self { slot, origin, hops: 0, route: Vec::new(), budget_ms, handed_back_by: None }
    }

    /// The request as forwarded by `node` with `budget_ms` left
    pub fn forwarded_by(&self, node: PeerId, budget_ms: u64) -> Self {
        let mut route = self.route.clone();
        route.push(node);
        Self { slot: self.slot, origin: self.origin, hops: self.hops + 1, route, budget_ms, handed_back_by: None }
    }

    /// The request as handed back by the owner `node` to its predecessor
    pub fn handed_back(&self, node: PeerId, budget_ms: u64) -> Self {
        Self { handed_back_by: Some(node), ..self.forwarded_by(node, budget_ms) }
    }

    /// Whether the hop count and route trace agree
    pub fn is_consistent(&self) -> bool {
        self.route.len() == self.hops as usize
    }
}

/// How a forwarded search ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStatus {
    Found { filename: String },
    NotFound,
    HopLimitExceeded,
    Unreachable { peer: PeerId },
    TimedOut,
}

/// Terminal result of a forwarded search, with diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub slot: u32,
    pub origin: PeerId,
    pub status: SearchStatus,

    /// Node that answered as owner, if the walk reached one
    pub resolved_by: Option<PeerId>,

    pub hops: u32,
    pub route: Vec<PeerId>,
}

impl SearchOutcome {
    /// Terminate `request` here with `status`
    pub fn terminal(request: &SearchRequest, status: SearchStatus, resolved_by: Option<PeerId>) -> Self {
        Self {
            slot: request.slot,
            origin: request.origin,
            status,
            resolved_by,
            hops: request.hops,
            route: request.route.clone(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.status, SearchStatus::Found { .. })
    }

    pub fn filename(&self) -> Option<&str> {
        match &self.status {
            SearchStatus::Found { filename } => Some(filename),
            _ => None,
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, self.resolved_by) {
            (SearchStatus::Found { filename }, Some(node)) => {
                writeln!(f, "FOUND: {filename} at Node {node}")?;
            },
            (SearchStatus::Found { filename }, None) => writeln!(f, "FOUND: {filename}")?,
            (SearchStatus::NotFound, Some(node)) => {
                writeln!(f, "File with hash {} not found at Node {node}", self.slot)?;
            },
            (SearchStatus::NotFound, None) => writeln!(f, "File with hash {} not found", self.slot)?,
            (SearchStatus::HopLimitExceeded, _) => {
                writeln!(f, "Search for hash {} exceeded the hop limit", self.slot)?;
            },
            (SearchStatus::Unreachable { peer }, _) => {
                writeln!(f, "Search for hash {} stopped: Node {peer} unreachable", self.slot)?;
            },
            (SearchStatus::TimedOut, _) => writeln!(f, "Search for hash {} timed out", self.slot)?,
        }

        writeln!(f, "Hops: {}", self.hops)?;
        write!(f, "Route: Node {}", self.origin)?;
        for node in self.route.iter().filter(|node| **node != self.origin) {
            write!(f, " -> Node {node}")?;
        }
        if let Some(node) = self.resolved_by.filter(|node| self.route.last() != Some(node)) {
            write!(f, " -> Node {node}")?;
        }
        Ok(())
    }
}

/// Serialize payload bytes as base64 text inside the JSON frame
mod payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_tags_on_the_wire() {
        let json = serde_json::to_value(Request::Download { filename: "a.txt".into() }).unwrap();
        assert_eq!(json["verb"], "DOWNLOAD");

        let json = serde_json::to_value(Request::ForwardSearch { request: SearchRequest::new(3, 1, 1000) }).unwrap();
        assert_eq!(json["verb"], "FORWARD_SEARCH");
        assert_eq!(json["request"]["hops"], 0);

        let json = serde_json::to_value(Request::Ping).unwrap();
        assert_eq!(json, serde_json::json!({ "verb": "PING" }));
    }

    #[test]
    fn test_payload_is_base64() {
        let request = Request::Upload { filename: "a".into(), sender_id: 5, payload: vec![0, 1, 2, 255] };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["payload"], "AAEC/w==");

        let back: Request = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_bad_base64_rejected() {
        let raw = r#"{"status":"FILE","payload":"!!not base64!!"}"#;
        assert!(serde_json::from_str::<Response>(raw).is_err());
    }

    #[test]
    fn test_unknown_verb_rejected() {
        let raw = r#"{"verb":"DELETE_EVERYTHING"}"#;
        assert!(serde_json::from_str::<Request>(raw).is_err());
    }

    #[test]
    fn test_forwarding_keeps_route_and_hops_in_step() {
        let request = SearchRequest::new(7, 1, 5000);
        assert!(request.is_consistent());

        let once = request.forwarded_by(1, 4000);
        let twice = once.forwarded_by(5, 3000);
        assert_eq!(twice.hops, 2);
        assert_eq!(twice.route, vec![1, 5]);
        assert_eq!(twice.budget_ms, 3000);
        assert!(twice.is_consistent());
        assert_eq!(request.hops, 0);
    }

    #[test]
    fn test_outcome_display() {
        let request = SearchRequest::new(7, 1, 5000).forwarded_by(1, 4000).forwarded_by(5, 3000);
        let outcome =
            SearchOutcome::terminal(&request, SearchStatus::Found { filename: "song.mp3".into() }, Some(9));
        let text = outcome.to_string();
        assert!(text.starts_with("FOUND: song.mp3 at Node 9"));
        assert!(text.contains("Hops: 2"));
        assert!(text.ends_with("Route: Node 1 -> Node 5 -> Node 9"));
    }
}
