//! Outbound transport for RingShare nodes.
//!
//! Every operation opens a fresh TCP connection, sends one request frame,
//! reads one response frame and closes. Connect and I/O steps are bounded by
//! timeouts; a refused, reset or stalled connection is reported as an
//! unreachable peer rather than a hard failure.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{max_frame_len, read_frame, write_frame, Request, Response};

/// Timeouts applied to each exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub io: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { connect: Duration::from_secs(3), io: Duration::from_secs(30) }
    }
}

/// Request/response client over plain TCP
#[derive(Debug, Clone)]
pub struct Transport {
    timeouts: Timeouts,
    frame_limit: usize,
}

impl Transport {
    pub fn new(timeouts: Timeouts, max_payload: usize) -> Self {
        Self { timeouts, frame_limit: max_frame_len(max_payload) }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn frame_limit(&self) -> usize {
        self.frame_limit
    }

    /// Open a connection, bounded by the connect timeout
    pub async fn connect(&self, addr: SocketAddr) -> Result<TcpStream> {
        trace!(%addr, "Connecting");
        let stream = timeout(self.timeouts.connect, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout { addr, after: self.timeouts.connect })?
            .map_err(|source| Error::PeerUnreachable { addr, source })?;
        stream.set_nodelay(true).ok();
        Ok(stream)
    }

    /// Send `request` to `addr` and wait for its response
    pub async fn exchange(&self, addr: SocketAddr, request: &Request) -> Result<Response> {
        self.exchange_within(addr, request, self.timeouts.io).await
    }

    /// Like [`Transport::exchange`] but waits at most `reply_within` for the
    /// response once the request is sent
    pub async fn exchange_within(
        &self,
        addr: SocketAddr,
        request: &Request,
        reply_within: Duration,
    ) -> Result<Response> {
        let mut stream = self.connect(addr).await?;
        debug!(%addr, verb = request.verb(), "Sending request");

        timeout(self.timeouts.io, write_frame(&mut stream, request))
            .await
            .map_err(|_| Error::Timeout { addr, after: self.timeouts.io })?
            .map_err(|e| into_unreachable(addr, e))?;

        let response = timeout(reply_within, read_frame(&mut stream, self.frame_limit))
            .await
            .map_err(|_| Error::Timeout { addr, after: reply_within })?
            .map_err(|e| into_unreachable(addr, e))?;

        Ok(response)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Timeouts::default(), crate::node::DEFAULT_MAX_PAYLOAD)
    }
}

/// Socket-level failures after connecting mean the peer went away
fn into_unreachable(addr: SocketAddr, err: Error) -> Error {
    match err {
        Error::Io(source) => Error::PeerUnreachable { addr, source },
        other => other,
    }
}

/// Errors that only mean the other side hung up
pub(crate) fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
