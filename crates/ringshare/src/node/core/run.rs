//! PeerNode run loop: accept connections and drive liveness probing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn, Instrument};

use super::peer_node::PeerNode;
use crate::error::{Error, Result};
use crate::handlers::handle_request;
use crate::node::events::{publish, NodeEvent};
use crate::protocol::{read_frame, write_frame, Request, Response};
use crate::transport::is_disconnect;

impl PeerNode {
    /// Bind the configured listen address, or this node's peer list address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_addr.unwrap_or(self.local.addr);
        let listener = TcpListener::bind(addr).await?;
        info!(node = self.local.id, addr = %listener.local_addr()?, "Listening");
        Ok(listener)
    }

    /// Accept connections on `listener` until the task is dropped.
    ///
    /// Each connection is served on its own task; at most
    /// `max_connections` are handled at once.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        let permits = Arc::new(Semaphore::new(self.config.max_connections));

        loop {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                return Ok(());
            };
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                },
            };

            let node = self.clone();
            let span = tracing::debug_span!("conn", node = self.local.id, %peer);
            tokio::spawn(
                async move {
                    node.handle_connection(stream, peer).await;
                    drop(permit);
                }
                .instrument(span),
            );
        }
    }

    /// Serve one request on `stream`. Failures only affect this connection.
    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let io_timeout = self.config.io_timeout;
        let read = timeout(io_timeout, read_frame::<Request, _>(&mut stream, self.transport.frame_limit())).await;

        let request = match read {
            Ok(Ok(request)) => request,
            Ok(Err(Error::Io(e))) if is_disconnect(&e) => {
                trace!(%peer, "Connection closed without a request");
                return;
            },
            Ok(Err(Error::Protocol(reason))) => {
                warn!(%peer, %reason, "Protocol violation, closing connection");
                let reply = Response::Rejected { reason };
                let _ = timeout(io_timeout, write_frame(&mut stream, &reply)).await;
                return;
            },
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "Failed to read request");
                return;
            },
            Err(_) => {
                debug!(%peer, "Timed out waiting for request");
                return;
            },
        };

        let verb = request.verb();
        debug!(%peer, verb, "Handling request");
        let response = handle_request(self, request).await;

        match timeout(io_timeout, write_frame(&mut stream, &response)).await {
            Ok(Ok(())) => trace!(%peer, verb, status = response.status(), "Response sent"),
            Ok(Err(Error::Io(e))) if is_disconnect(&e) => debug!(%peer, verb, "Peer left before the response"),
            Ok(Err(e)) => warn!(%peer, verb, error = %e, "Failed to send response"),
            Err(_) => warn!(%peer, verb, "Timed out sending response"),
        }
    }

    /// Start periodic liveness probing, publishing changes as
    /// [`NodeEvent::PeerStatusChanged`]
    pub fn spawn_liveness(&self) -> JoinHandle<()> {
        let events = self.events.clone();
        self.liveness.clone().spawn(self.config.probe_interval, move |event| {
            publish(&events, NodeEvent::PeerStatusChanged(event));
        })
    }

    /// Run the node until Ctrl+C is pressed or the listener fails.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = self.bind().await?;
        let liveness = self.spawn_liveness();
        info!(node = self.local.id, "Node started. Press Ctrl+C to exit.");

        let result = tokio::select! {
            served = self.clone().serve(listener) => served,
            _ = signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down node.");
                Ok(())
            }
        };

        liveness.abort();
        if let Err(e) = &result {
            error!(error = %e, "Node stopped");
        }
        result
    }
}
