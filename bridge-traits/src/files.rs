//! File Store Abstraction
//!
//! Flat-file persistence for downloaded archives. The existence of a file in
//! the downloads directory is the sole "already downloaded" signal; there is
//! no separate manifest.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Async flat-file store.
///
/// Paths are absolute; the caller (the download store in `core-download`)
/// owns naming and directory layout. Implementations map onto the platform
/// filesystem (desktop: tokio fs under the app data directory).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Create a directory and any missing parents. Idempotent.
    async fn create_dir_all(&self, dir: &Path) -> Result<()>;

    /// Check whether a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Write the full contents of a file, replacing it if present.
    async fn write(&self, path: &Path, contents: &Bytes) -> Result<()>;

    /// Read the full contents of a file.
    async fn read(&self, path: &Path) -> Result<Bytes>;
}
