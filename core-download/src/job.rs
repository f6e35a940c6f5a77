//! # Export Job State Machine
//!
//! Wraps one remote export request and drives it to a terminal state by
//! polling.
//!
//! ## State Machine
//!
//! ```text
//! QUEUED → IN_PROGRESS → SUCCEEDED
//!     ↓         ↓
//!     └──────→ FAILED
//! ```
//!
//! The initial state is whatever the creation call returns (the service may
//! report `IN_PROGRESS`, or even a terminal state, straight away). Terminal
//! states are sticky: once observed, no further poll is issued and later
//! snapshots cannot regress the status.
//!
//! ## Usage
//!
//! ```ignore
//! use core_download::job::{ExportJob, ExportJobConfig};
//!
//! let mut job = ExportJob::start(provider, "folder-key", "My Song",
//!     ExportJobConfig::default()).await?;
//!
//! let archives = job.wait_for_terminal(|status, percent| {
//!     println!("{status}: {percent:?}");
//! }).await?;
//! ```

use bridge_traits::export::{ExportProvider, ExportSnapshot, ExportStatus, RemoteArchive};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::{DownloadError, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Polling configuration for one export job
#[derive(Debug, Clone)]
pub struct ExportJobConfig {
    /// Delay between polls
    pub poll_interval: Duration,

    /// Overall deadline for reaching a terminal status. `None` polls
    /// forever, which is what the service's web client does; the default is
    /// bounded so a wedged job cannot pin a pipeline indefinitely.
    pub max_wait: Option<Duration>,
}

impl Default for ExportJobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl ExportJobConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Poll with no overall deadline.
    pub fn with_unbounded_wait(mut self) -> Self {
        self.max_wait = None;
        self
    }
}

// ============================================================================
// Export Job
// ============================================================================

/// One remote export request, from creation to terminal state.
///
/// Construction performs the creation call; the job is discarded after the
/// terminal state is observed (nothing is persisted).
pub struct ExportJob {
    provider: Arc<dyn ExportProvider>,
    config: ExportJobConfig,
    id: String,
    archive_name: String,
    status: ExportStatus,
    percent_done: Option<f32>,
    num_fetched_files: Option<u64>,
    archives: Vec<RemoteArchive>,
}

impl std::fmt::Debug for ExportJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportJob")
            .field("id", &self.id)
            .field("archive_name", &self.archive_name)
            .field("status", &self.status)
            .field("percent_done", &self.percent_done)
            .field("num_fetched_files", &self.num_fetched_files)
            .field("archives", &self.archives)
            .finish_non_exhaustive()
    }
}

impl ExportJob {
    /// Create the remote export job and bind its first snapshot.
    ///
    /// # Errors
    ///
    /// Fails when the creation call fails; a non-success HTTP status maps to
    /// [`DownloadError::Network`].
    #[instrument(skip(provider, config), fields(folder_key = %folder_key))]
    pub async fn start(
        provider: Arc<dyn ExportProvider>,
        folder_key: &str,
        archive_name: &str,
        config: ExportJobConfig,
    ) -> Result<Self> {
        let snapshot = provider.create_export(folder_key, archive_name).await?;

        info!(job_id = %snapshot.id, status = %snapshot.status, "Export job started");

        Ok(Self {
            provider,
            config,
            id: snapshot.id,
            archive_name: archive_name.to_string(),
            status: snapshot.status,
            percent_done: snapshot.percent_done,
            num_fetched_files: snapshot.num_fetched_files,
            archives: snapshot.archives,
        })
    }

    /// Opaque job identifier assigned by the service.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requested archive name prefix.
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Latest observed status.
    pub fn status(&self) -> ExportStatus {
        self.status
    }

    /// Latest reported progress percentage.
    pub fn percent_done(&self) -> Option<f32> {
        self.percent_done
    }

    /// Latest reported count of fetched files.
    pub fn num_fetched_files(&self) -> Option<u64> {
        self.num_fetched_files
    }

    /// Fold a snapshot into the job. Terminal states are sticky.
    fn apply_snapshot(&mut self, snapshot: ExportSnapshot) {
        if self.status.is_terminal() {
            return;
        }

        self.status = snapshot.status;
        self.percent_done = snapshot.percent_done;
        self.num_fetched_files = snapshot.num_fetched_files;
        if !snapshot.archives.is_empty() {
            self.archives = snapshot.archives;
        }
    }

    /// Poll until the job reaches a terminal state.
    ///
    /// `on_progress` is invoked after every poll, regardless of outcome, so
    /// callers can reflect intermediate state. A failed poll call is fatal
    /// for the job; there is no poll retry at this layer.
    ///
    /// Cancellation is by drop: abandoning the returned future stops the
    /// loop at the next suspension point.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::JobFailed`] when the service reports `FAILED`
    /// - [`DownloadError::EmptyResult`] when it reports `SUCCEEDED` with no
    ///   archives
    /// - [`DownloadError::Stuck`] when `max_wait` elapses first
    /// - [`DownloadError::Network`] / [`DownloadError::Provider`] when a
    ///   poll call itself fails
    #[instrument(skip(self, on_progress), fields(job_id = %self.id))]
    pub async fn wait_for_terminal<F>(&mut self, mut on_progress: F) -> Result<Vec<RemoteArchive>>
    where
        F: FnMut(ExportStatus, Option<f32>),
    {
        let started = Instant::now();

        while !self.status.is_terminal() {
            if let Some(max_wait) = self.config.max_wait {
                if started.elapsed() >= max_wait {
                    warn!(waited_secs = started.elapsed().as_secs(), "Export job stuck");
                    return Err(DownloadError::Stuck {
                        waited_secs: started.elapsed().as_secs(),
                    });
                }
            }

            sleep(self.config.poll_interval).await;

            let snapshot = self.provider.poll_export(&self.id).await?;
            self.apply_snapshot(snapshot);
            debug!(status = %self.status, percent = ?self.percent_done, "Polled export job");

            on_progress(self.status, self.percent_done);
        }

        match self.status {
            ExportStatus::Succeeded => {
                if self.archives.is_empty() {
                    warn!("Export succeeded with no archives");
                    Err(DownloadError::EmptyResult)
                } else {
                    Ok(self.archives.clone())
                }
            }
            ExportStatus::Failed => Err(DownloadError::JobFailed),
            // Loop invariant: only terminal states fall through.
            _ => unreachable!("non-terminal status after polling loop"),
        }
    }
}
