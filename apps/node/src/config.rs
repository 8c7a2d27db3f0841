use std::net::SocketAddr;
use std::time::Duration;
use std::{fmt, fs, io, path};

use ringshare::{NodeConfig, PeerId, ProbeStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to parse config {}: {source}", .path.display())]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("failed to write config {}: {source}", .path.display())]
    WriteFailed { path: path::PathBuf, source: io::Error },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: Storage,
    pub network: Network,
    pub liveness: Liveness,
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub shared_dir: path::PathBuf,
    pub downloads_dir: path::PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
    pub search_budget_ms: u64,
    pub max_connections: usize,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Liveness {
    pub interval_secs: u64,
    pub strategy: ProbeStrategy,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Append-only operational log; omit to log to the console only
    pub file: Option<path::PathBuf>,
}

impl Default for Storage {
    fn default() -> Self {
        Self { shared_dir: "shared".into(), downloads_dir: "downloads".into() }
    }
}

impl Default for Network {
    fn default() -> Self {
        let node = NodeConfig::default();
        Self {
            connect_timeout_ms: node.connect_timeout.as_millis() as u64,
            io_timeout_ms: node.io_timeout.as_millis() as u64,
            search_budget_ms: node.search_budget.as_millis() as u64,
            max_connections: node.max_connections,
            max_payload_bytes: node.max_payload_bytes,
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self { interval_secs: 5, strategy: ProbeStrategy::Connect }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { file: Some("log.txt".into()) }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Node Configuration:")?;
        write_title_1(f, "Storage")?;
        write_1(f, "Shared", &self.storage.shared_dir.display())?;
        write_1(f, "Downloads", &self.storage.downloads_dir.display())?;
        write_title_1(f, "Network")?;
        write_1(f, "Connect timeout (ms)", &self.network.connect_timeout_ms)?;
        write_1(f, "I/O timeout (ms)", &self.network.io_timeout_ms)?;
        write_1(f, "Search budget (ms)", &self.network.search_budget_ms)?;
        write_1(f, "Max connections", &self.network.max_connections)?;
        write_title_1(f, "Liveness")?;
        write_1(f, "Interval (s)", &self.liveness.interval_secs)?;
        write_1(f, "Strategy", &format!("{:?}", self.liveness.strategy).to_lowercase())?;
        write_title_1(f, "Logging")?;
        match &self.logging.file {
            Some(file) => write_1(f, "File", &file.display())?,
            None => write_1(f, "File", &"(console only)")?,
        }

        Ok(())
    }
}

impl Config {
    /// Load a TOML config. Without a path the defaults are used; a path that
    /// does not exist yet is created holding the defaults.
    pub fn from_config(optional_path: Option<&path::Path>) -> Result<Self, Error> {
        let Some(path) = optional_path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            let config = Self::default();
            config.write_config(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)
            .map_err(|source| Error::ReadFailed { path: path.to_path_buf(), source })?;
        toml::from_str(&raw).map_err(|source| Error::ParseFailed { path: path.to_path_buf(), source })
    }

    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let raw = toml::to_string_pretty(self)?;
        let write_failed = |source| Error::WriteFailed { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(path, raw).map_err(write_failed)
    }

    /// Library configuration for node `id` listening on `listen`
    pub fn node_config(&self, id: PeerId, listen: SocketAddr) -> NodeConfig {
        NodeConfig::builder(id)
            .listen_addr(listen)
            .shared_dir(&self.storage.shared_dir)
            .downloads_dir(&self.storage.downloads_dir)
            .probe_interval(Duration::from_secs(self.liveness.interval_secs.max(1)))
            .probe_strategy(self.liveness.strategy)
            .connect_timeout(Duration::from_millis(self.network.connect_timeout_ms))
            .io_timeout(Duration::from_millis(self.network.io_timeout_ms))
            .search_budget(Duration::from_millis(self.network.search_budget_ms))
            .max_connections(self.network.max_connections)
            .max_payload_bytes(self.network.max_payload_bytes)
            .build()
    }
}
