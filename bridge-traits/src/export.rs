//! Remote Export Seam
//!
//! The file-hosting service packages a remote folder into downloadable
//! archives through an asynchronous server-side export job. This module
//! defines the provider trait the core polls against, plus the snapshot
//! types shared between the provider implementation and the job state
//! machine in `core-download`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{BridgeError, Result};

// ============================================================================
// Status
// ============================================================================

/// Remote export job status as reported by the service.
///
/// The wire form is SCREAMING_SNAKE (`QUEUED`, `IN_PROGRESS`, ...). A job
/// moves through `Queued -> InProgress -> {Succeeded | Failed}` and never
/// leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStatus {
    /// Job accepted but not yet started
    Queued,
    /// Job is packaging files
    InProgress,
    /// Job finished and archives are available
    Succeeded,
    /// Job failed on the service side
    Failed,
}

impl ExportStatus {
    /// Check if this status represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportStatus::Succeeded | ExportStatus::Failed)
    }

    /// Get the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Queued => "QUEUED",
            ExportStatus::InProgress => "IN_PROGRESS",
            ExportStatus::Succeeded => "SUCCEEDED",
            ExportStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ExportStatus {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "QUEUED" => Ok(ExportStatus::Queued),
            "IN_PROGRESS" => Ok(ExportStatus::InProgress),
            "SUCCEEDED" => Ok(ExportStatus::Succeeded),
            "FAILED" => Ok(ExportStatus::Failed),
            _ => Err(BridgeError::OperationFailed(format!(
                "Unknown export status: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// A single archive produced by an export job.
///
/// Sizes arrive as decimal strings on the wire and are kept that way; the
/// core only displays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteArchive {
    /// Archive file name assigned by the service
    pub file_name: String,

    /// Retrieval URL for the archive contents
    pub storage_path: String,

    /// Compressed size in bytes (decimal string)
    #[serde(default)]
    pub compressed_size: Option<String>,

    /// Uncompressed size in bytes (decimal string)
    #[serde(default)]
    pub size_of_contents: Option<String>,
}

/// Point-in-time view of an export job.
///
/// Returned by both creation and polling; the archive list is typically
/// empty until the job succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    /// Opaque job identifier assigned by the service on creation
    pub id: String,

    /// Current job status
    pub status: ExportStatus,

    /// Progress percentage, when the service reports one
    pub percent_done: Option<f32>,

    /// Count of files fetched into the archive so far
    pub num_fetched_files: Option<u64>,

    /// Archives produced so far (ordered; complete once `Succeeded`)
    pub archives: Vec<RemoteArchive>,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Remote export API seam.
///
/// The service offers no push or webhook mechanism, so the core drives every
/// job by polling. Implementations translate these calls into the provider's
/// HTTP API and normalize failures into [`BridgeError`], keeping HTTP status
/// information via [`BridgeError::Http`].
///
/// # Example
///
/// ```ignore
/// use bridge_traits::export::ExportProvider;
///
/// async fn kick_off(provider: &dyn ExportProvider) -> Result<String> {
///     let snapshot = provider.create_export("folder-key", "My Song").await?;
///     Ok(snapshot.id)
/// }
/// ```
#[async_trait]
pub trait ExportProvider: Send + Sync {
    /// Resolve the human-readable folder title for a folder key.
    ///
    /// This is a lightweight page scrape used only to label the archive;
    /// callers treat its failure as non-fatal and fall back to their own
    /// display name.
    async fn resolve_display_name(&self, folder_key: &str) -> Result<String>;

    /// Create a new export job for a folder.
    ///
    /// `archive_prefix` is the desired archive name prefix. Returns the
    /// initial snapshot, whose status may already be past `Queued`.
    async fn create_export(&self, folder_key: &str, archive_prefix: &str)
        -> Result<ExportSnapshot>;

    /// Re-fetch the current snapshot for an existing job.
    async fn poll_export(&self, job_id: &str) -> Result<ExportSnapshot>;

    /// Fetch an archive's contents.
    ///
    /// No timeout is applied here; the orchestrator wraps this call so the
    /// abort is observable and reported distinctly.
    async fn fetch_archive(&self, archive: &RemoteArchive) -> Result<Bytes>;
}
