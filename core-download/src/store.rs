//! Local Archive Persistence
//!
//! One file per song under the downloads directory. The file name is the
//! lower-cased, alphanumeric-sanitized song title plus the chart archive
//! extension; the existence of that file is the sole "already downloaded"
//! signal.

use bridge_traits::files::FileStore;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DownloadError, Result};

/// Chart archive extension expected by the companion application.
pub const ARCHIVE_EXTENSION: &str = "adx";

/// Build the local file name for a song title: every character outside
/// `[a-zA-Z0-9]` becomes `_`, the rest is lower-cased.
pub fn sanitized_file_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}.{ARCHIVE_EXTENSION}")
}

/// File name for a recombined batch archive. Unique per flush so a batch
/// never clobbers a song file or a previous batch.
pub fn batch_file_name() -> String {
    format!("batch-{}.{ARCHIVE_EXTENSION}", Uuid::new_v4())
}

/// Downloads-directory wrapper over the platform [`FileStore`].
#[derive(Clone)]
pub struct DownloadStore {
    files: Arc<dyn FileStore>,
    downloads_dir: PathBuf,
}

impl DownloadStore {
    pub fn new(files: Arc<dyn FileStore>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            files,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Local path an archive for this title would live at.
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.downloads_dir.join(sanitized_file_name(title))
    }

    /// Whether an archive for this title has already been downloaded.
    pub async fn exists(&self, title: &str) -> Result<bool> {
        self.files
            .exists(&self.path_for(title))
            .await
            .map_err(|e| DownloadError::Store(e.to_string()))
    }

    /// Persist a song archive, creating the downloads directory on demand.
    pub async fn write(&self, title: &str, contents: &Bytes) -> Result<PathBuf> {
        let path = self.path_for(title);
        self.write_raw(&path, contents).await?;
        Ok(path)
    }

    /// Persist a file under the downloads directory by explicit file name.
    pub async fn write_named(&self, file_name: &str, contents: &Bytes) -> Result<PathBuf> {
        let path = self.downloads_dir.join(file_name);
        self.write_raw(&path, contents).await?;
        Ok(path)
    }

    /// Read back a previously persisted archive.
    pub async fn read_path(&self, path: &Path) -> Result<Bytes> {
        self.files
            .read(path)
            .await
            .map_err(|e| DownloadError::Store(e.to_string()))
    }

    async fn write_raw(&self, path: &Path, contents: &Bytes) -> Result<()> {
        self.files
            .create_dir_all(&self.downloads_dir)
            .await
            .map_err(|e| DownloadError::Store(e.to_string()))?;
        self.files
            .write(path, contents)
            .await
            .map_err(|e| DownloadError::Store(e.to_string()))?;
        debug!(path = %path.display(), bytes = contents.len(), "Archive persisted");
        Ok(())
    }
}
