//! FORWARD_SEARCH handling.
//!
//! A search walks the ring one node at a time. Each node decides whether it
//! owns the slot; if not, it appends itself to the route, hands the request
//! to the next active node and relays whatever terminal outcome comes back.
//! The walk is bounded by a hop limit equal to the peer count and by the
//! cumulative time budget carried in the request.
//!
//! Linear probing can leave a file on a node that does not own its slot, so
//! any node holding the slot answers directly, and an owner that misses asks
//! its predecessor once before reporting `NotFound`.

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::node::PeerNode;
use crate::protocol::{Request, Response, SearchOutcome, SearchRequest, SearchStatus};
use crate::ring::{PeerDescriptor, HASH_RANGE};

/// Kept back from the remaining budget when forwarding so the next hop
/// answers before this node stops waiting
const FORWARD_MARGIN: Duration = Duration::from_millis(100);

/// Reject requests whose diagnostics are already inconsistent
pub fn check_request(request: &SearchRequest) -> Result<(), String> {
    if request.slot >= HASH_RANGE {
        return Err(format!("slot {} outside 0..{HASH_RANGE}", request.slot));
    }
    if !request.is_consistent() {
        return Err(format!("route has {} entries but hop count is {}", request.route.len(), request.hops));
    }
    Ok(())
}

/// Resolve `request` here or forward it one hop, returning the terminal outcome
pub async fn forward_search(node: &PeerNode, request: SearchRequest) -> SearchOutcome {
    let started = Instant::now();
    let local = node.local().id;

    // A relocated file can sit on a node that does not own its slot
    if let Some(filename) = node.file_at(request.slot).await {
        info!(slot = request.slot, origin = request.origin, hops = request.hops, "Search resolved from local catalog");
        return SearchOutcome::terminal(&request, SearchStatus::Found { filename }, Some(local));
    }
    if let Some(owner) = request.handed_back_by {
        debug!(slot = request.slot, owner, "Handed-back search missed here too");
        return SearchOutcome::terminal(&request, SearchStatus::NotFound, Some(owner));
    }

    let liveness = node.liveness().snapshot().await;
    let router = node.router();
    let max_hops = router.registry().len() as u32;

    if router.is_local_owner(request.slot, &liveness) {
        let missed = SearchOutcome::terminal(&request, SearchStatus::NotFound, Some(local));
        let Some(prev) = router
            .prev_hop(local, &liveness)
            .filter(|prev| request.hops < max_hops && !request.route.contains(&prev.id))
            .copied()
        else {
            info!(slot = request.slot, origin = request.origin, hops = request.hops, "Search missed at owner");
            return missed;
        };
        let Some((remaining, downstream)) = budget_left(&request, started) else {
            return missed;
        };

        debug!(slot = request.slot, prev = prev.id, "Owner missed, asking predecessor");
        let handed_back = request.handed_back(local, downstream.as_millis() as u64);
        return match relay(node, prev, &handed_back, remaining).await {
            Ok(outcome) if outcome.is_found() => outcome,
            Ok(_) | Err(_) => {
                info!(slot = request.slot, origin = request.origin, hops = request.hops, "Search missed at owner");
                missed
            },
        };
    }

    if request.hops >= max_hops {
        warn!(slot = request.slot, origin = request.origin, hops = request.hops, "Search exceeded hop limit");
        return SearchOutcome::terminal(&request, SearchStatus::HopLimitExceeded, None);
    }

    let Some(next) = router.next_hop(local, &liveness).copied() else {
        debug!(slot = request.slot, "No active successor to forward to");
        return SearchOutcome::terminal(&request, SearchStatus::NotFound, None);
    };

    let Some((remaining, downstream)) = budget_left(&request, started) else {
        warn!(slot = request.slot, hops = request.hops, "Search budget exhausted");
        return SearchOutcome::terminal(&request, SearchStatus::TimedOut, None);
    };

    let forwarded = request.forwarded_by(local, downstream.as_millis() as u64);
    debug!(slot = request.slot, next = next.id, hops = forwarded.hops, "Forwarding search");

    relay(node, next, &forwarded, remaining)
        .await
        .unwrap_or_else(|status| SearchOutcome::terminal(&forwarded, status, None))
}

/// Time still available here and the budget to pass downstream, or `None`
/// once less than the forwarding margin is left
fn budget_left(request: &SearchRequest, started: Instant) -> Option<(Duration, Duration)> {
    let remaining = Duration::from_millis(request.budget_ms).saturating_sub(started.elapsed());
    let downstream = remaining.saturating_sub(FORWARD_MARGIN);
    (!downstream.is_zero()).then_some((remaining, downstream))
}

/// Send `request` to `peer` and wait at most `remaining` for its outcome
async fn relay(
    node: &PeerNode,
    peer: PeerDescriptor,
    request: &SearchRequest,
    remaining: Duration,
) -> Result<SearchOutcome, SearchStatus> {
    let message = Request::ForwardSearch { request: request.clone() };
    let exchange = node.transport().exchange_within(peer.addr, &message, remaining);

    match timeout(remaining, exchange).await {
        Ok(Ok(Response::SearchResult { outcome })) => Ok(outcome),
        Ok(Ok(other)) => {
            warn!(peer = peer.id, reply = other.status(), "Unexpected reply to forwarded search");
            Err(SearchStatus::Unreachable { peer: peer.id })
        },
        Ok(Err(Error::Timeout { .. })) | Err(_) => {
            warn!(peer = peer.id, slot = request.slot, "Forwarded search timed out");
            Err(SearchStatus::TimedOut)
        },
        Ok(Err(e)) => {
            warn!(peer = peer.id, slot = request.slot, error = %e, "Could not forward search");
            Err(SearchStatus::Unreachable { peer: peer.id })
        },
    }
}
