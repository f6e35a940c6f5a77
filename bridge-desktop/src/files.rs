//! File Store Implementation over tokio fs

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    files::FileStore,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default downloads directory: `<data dir>/chartdl/adx-downloads`.
///
/// Falls back to a path under the current directory when the platform
/// reports no data directory (some containerized environments).
pub fn default_downloads_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartdl")
        .join("adx-downloads")
}

/// Local-filesystem file store
#[derive(Debug, Default, Clone)]
pub struct NativeFileStore;

impl NativeFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStore for NativeFileStore {
    async fn create_dir_all(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn write(&self, path: &Path, contents: &Bytes) -> Result<()> {
        tokio::fs::write(path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "File written");
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(path).await?))
    }
}
