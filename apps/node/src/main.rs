#![warn(clippy::all)]

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use ringshare::{PeerNode, PeerRegistry};
use tracing::{info, warn};

mod config;
mod console;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "ringshare-node", version, about = "Run a RingShare peer")]
struct Cli {
    /// This node's ring id; must appear in the peer list
    id: u32,

    /// Address to listen on
    ip: IpAddr,

    port: u16,

    /// File of `id,ip,port` lines describing every peer
    peer_list: PathBuf,

    /// TOML configuration file, created with the defaults if it does not exist
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_config(cli.config.as_deref()).context("loading configuration")?;
    logger::init_tracing(config.logging.file.as_deref()).context("initialising logging")?;

    let registry = PeerRegistry::load(&cli.peer_list)
        .with_context(|| format!("loading peer list {}", cli.peer_list.display()))?;

    let listen = SocketAddr::new(cli.ip, cli.port);
    if let Some(entry) = registry.get(cli.id).filter(|entry| entry.addr != listen) {
        warn!(listed = %entry.addr, %listen, "Listen address differs from the peer list entry");
    }

    let node = PeerNode::new(config.node_config(cli.id, listen), registry)
        .with_context(|| format!("starting node {}", cli.id))?;
    let node = Arc::new(node);
    info!("{config}");

    console::spawn_event_printer(&node);
    console::spawn(node.clone());

    node.run().await?;
    Ok(())
}
