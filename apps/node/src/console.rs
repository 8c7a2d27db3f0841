//! Line-oriented console driving a node from stdin.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use ringshare::{PeerId, PeerNode, HASH_RANGE};
use ringshare::node::handle_node_event;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, warn};

const HELP: &str = "\
commands:
  upload <path>              send a file to the node owning its hash
  search <slot>              walk the ring for a slot
  download <slot>            search for a slot and fetch the file
  get <peer> <filename>      fetch a file straight from a peer
  query <peer> <filename>    ask a peer whether it stores a file
  delete <filename>          remove a file stored here
  ls                         list files stored here
  peers                      show peer liveness
  help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Search(u32),
    Download(u32),
    Get(PeerId, String),
    Query(PeerId, String),
    Delete(String),
    List,
    Peers,
    Help,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.trim().splitn(3, char::is_whitespace);
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let first = words.next().map(str::trim);
        let rest = words.next().map(str::trim);

        let slot = |arg: Option<&str>| -> Result<u32, String> {
            let raw = arg.ok_or("missing slot")?;
            raw.parse::<u32>()
                .ok()
                .filter(|slot| *slot < HASH_RANGE)
                .ok_or_else(|| format!("slot must be 0..{}", HASH_RANGE - 1))
        };
        let peer_and_name = |first: Option<&str>, rest: Option<&str>| -> Result<(PeerId, String), String> {
            let peer = first.ok_or("missing peer id")?.parse().map_err(|_| "peer id must be a number")?;
            let name = rest.filter(|name| !name.is_empty()).ok_or("missing filename")?;
            Ok((peer, name.to_string()))
        };
        let joined = || match (first, rest) {
            (Some(first), Some(rest)) => Some(format!("{first} {rest}")),
            (Some(first), None) if !first.is_empty() => Some(first.to_string()),
            _ => None,
        };

        match verb.as_str() {
            "upload" => joined().map(|path| Command::Upload(path.into())).ok_or_else(|| "missing path".into()),
            "search" => slot(first).map(Command::Search),
            "download" => slot(first).map(Command::Download),
            "get" => peer_and_name(first, rest).map(|(peer, name)| Command::Get(peer, name)),
            "query" => peer_and_name(first, rest).map(|(peer, name)| Command::Query(peer, name)),
            "delete" => joined().map(Command::Delete).ok_or_else(|| "missing filename".into()),
            "ls" => Ok(Command::List),
            "peers" => Ok(Command::Peers),
            "help" | "?" => Ok(Command::Help),
            other => Err(format!("unknown command {other:?}, try help")),
        }
    }
}

/// Log node notifications as they arrive
pub fn spawn_event_printer(node: &PeerNode) -> JoinHandle<()> {
    let mut events = node.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => handle_node_event(&event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Dropped node events"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Read commands from stdin until it closes
pub fn spawn(node: Arc<PeerNode>) -> JoinHandle<()> {
    tokio::spawn(async move {
        println!("{HELP}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    break;
                },
            };
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(command) => execute(&node, command).await,
                Err(reason) => println!("{reason}"),
            }
        }
    })
}

async fn execute(node: &PeerNode, command: Command) {
    match command {
        Command::Upload(path) => match node.upload(&path).await {
            Ok(receipt) => {
                println!("Uploaded {} to Node {} at slot {}", receipt.filename, receipt.stored_at, receipt.slot);
                if receipt.is_relocated() {
                    println!("  hashed to slot {} which was taken", receipt.natural_slot);
                }
                if receipt.fallback {
                    println!("  successor not active, file kept on this node for now");
                }
            },
            Err(e) => println!("Upload failed: {e}"),
        },
        Command::Search(slot) => match node.search(slot).await {
            Ok(outcome) => println!("{outcome}"),
            Err(e) => println!("Search failed: {e}"),
        },
        Command::Download(slot) => match node.download(slot).await {
            Ok(file) => println!("Downloaded {} from Node {} to {}", file.filename, file.from, file.path.display()),
            Err(e) => println!("Download failed: {e}"),
        },
        Command::Get(peer, filename) => match node.download_from(peer, &filename).await {
            Ok(file) => println!("Downloaded {} ({} bytes) to {}", file.filename, file.bytes, file.path.display()),
            Err(e) => println!("Download failed: {e}"),
        },
        Command::Query(peer, filename) => match node.query_peer(peer, &filename).await {
            Ok(true) => println!("Node {peer} has {filename}"),
            Ok(false) => println!("Node {peer} does not have {filename}"),
            Err(e) => println!("Query failed: {e}"),
        },
        Command::Delete(filename) => match node.delete(&filename).await {
            Ok(slot) => println!("Deleted {filename} (slot {slot})"),
            Err(e) => println!("Delete failed: {e}"),
        },
        Command::List => {
            let files = node.local_files().await;
            if files.is_empty() {
                println!("No files stored");
            }
            for entry in files {
                println!("{:>3}  {}", entry.slot, entry.filename);
            }
        },
        Command::Peers => {
            for (peer, active) in node.peer_statuses().await {
                let marker = if peer.id == node.local().id { " (this node)" } else { "" };
                println!("{peer}  {}{marker}", if active { "active" } else { "inactive" });
            }
        },
        Command::Help => println!("{HELP}"),
    }
}
