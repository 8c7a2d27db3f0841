//! On-disk storage for served and downloaded files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::Result;
use crate::handlers::validate_filename;

/// Served files live in `shared_dir`, fetched files in `downloads_dir`
#[derive(Debug, Clone)]
pub struct FileStore {
    shared_dir: PathBuf,
    downloads_dir: PathBuf,
}

impl FileStore {
    pub fn new(shared_dir: impl Into<PathBuf>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self { shared_dir: shared_dir.into(), downloads_dir: downloads_dir.into() }
    }

    pub fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Path of a served file
    pub fn shared_path(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        Ok(self.shared_dir.join(filename))
    }

    /// Write a served file, replacing any previous content
    pub async fn write_shared(&self, filename: &str, payload: &[u8]) -> Result<PathBuf> {
        let path = self.shared_path(filename)?;
        write_file(&path, payload).await?;
        Ok(path)
    }

    /// Read a served file; `None` if it does not exist
    pub async fn read_shared(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.shared_path(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a served file; returns whether anything was deleted
    pub async fn remove_shared(&self, filename: &str) -> Result<bool> {
        let path = self.shared_path(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Save a downloaded file
    pub async fn write_download(&self, filename: &str, payload: &[u8]) -> Result<PathBuf> {
        validate_filename(filename)?;
        let path = self.downloads_dir.join(filename);
        write_file(&path, payload).await?;
        Ok(path)
    }
}

/// Write through a temporary sibling and rename so readers never see a partial file
async fn write_file(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    fs::write(&partial, payload).await?;
    fs::rename(&partial, path).await?;
    debug!(path = %path.display(), bytes = payload.len(), "Wrote file");
    Ok(())
}
