//! # Download Orchestrator
//!
//! Turns a user-requested set of songs into either an immediate handoff of
//! already-downloaded files, or a set of concurrent remote exports followed
//! by local persistence and a single batched handoff.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ DownloadOrchestrator │
//! │ - BatchState (mutex) │
//! └──────────┬───────────┘
//!            │ one spawned pipeline per song
//!            ├──> ExportProvider (resolve name, create, poll, fetch)
//!            ├──> DownloadStore  (persist archives, existence checks)
//!            ├──> OutputHandoff  (deliver / share, behind the gate)
//!            └──> EventBus       (display projections for the host UI)
//! ```
//!
//! ## Batching
//!
//! Every pipeline shares one accumulation buffer and one in-flight counter
//! inside a single mutex. A finishing pipeline decrements the counter,
//! appends its file, and decides in the same critical section whether it
//! was the last one; only then is the buffer drained and handed off.
//! That makes the flush happen at most once per batch epoch even though the
//! pipelines run on a multi-threaded runtime.

use bridge_traits::export::{ExportProvider, ExportStatus};
use bridge_traits::handoff::{HandoffOutcome, OutputHandoff};
use core_catalog::Song;
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus, HandoffEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::archive;
use crate::error::{DownloadError, Result};
use crate::job::{ExportJob, ExportJobConfig};
use crate::store::{self, DownloadStore};

// ============================================================================
// Configuration
// ============================================================================

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Delay between export polls
    pub poll_interval: Duration,

    /// Limit for the archive fetch; exceeding it aborts the request
    pub fetch_timeout: Duration,

    /// Overall deadline for one export job to reach a terminal status
    pub max_wait: Option<Duration>,

    /// How long completed entries stay visible after a flush
    pub completed_grace: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(90),
            max_wait: Some(Duration::from_secs(30 * 60)),
            completed_grace: Duration::from_millis(1500),
        }
    }
}

impl DownloadConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_completed_grace(mut self, grace: Duration) -> Self {
        self.completed_grace = grace;
        self
    }

    fn job_config(&self) -> ExportJobConfig {
        let config = ExportJobConfig::default().with_poll_interval(self.poll_interval);
        match self.max_wait {
            Some(max_wait) => config.with_max_wait(max_wait),
            None => config.with_unbounded_wait(),
        }
    }
}

// ============================================================================
// Display Projection
// ============================================================================

/// Display status of an in-flight download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Queued,
    InProgress,
    Completed,
}

/// One row of the host UI's "current downloads" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJobEntry {
    /// Request key (the hosting-service folder key)
    pub folder_id: String,
    /// Display title
    pub title: String,
    /// Display artist
    pub artist: Option<String>,
    /// Display status tag
    pub status: EntryStatus,
    /// Export progress, when the service reports one
    pub percent_done: Option<f32>,
}

/// A persisted archive awaiting handoff.
#[derive(Debug, Clone)]
struct CompletedDownload {
    path: PathBuf,
    title: String,
}

/// Shared mutable state of the current batch epoch.
#[derive(Default)]
struct BatchState {
    entries: Vec<DownloadJobEntry>,
    buffer: Vec<CompletedDownload>,
    in_flight: usize,
    downloaded: HashSet<String>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives concurrent export pipelines and the batched handoff.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    provider: Arc<dyn ExportProvider>,
    store: DownloadStore,
    handoff: Arc<dyn OutputHandoff>,
    events: EventBus,
    config: DownloadConfig,
    state: Arc<Mutex<BatchState>>,
}

impl DownloadOrchestrator {
    pub fn new(
        provider: Arc<dyn ExportProvider>,
        store: DownloadStore,
        handoff: Arc<dyn OutputHandoff>,
        events: EventBus,
        config: DownloadConfig,
    ) -> Self {
        Self {
            provider,
            store,
            handoff,
            events,
            config,
            state: Arc::new(Mutex::new(BatchState::default())),
        }
    }

    /// Request a single song.
    ///
    /// When a local archive already exists no export job is created: the
    /// file joins the accumulation buffer and, if nothing else is in
    /// flight, is handed off immediately. Otherwise an export pipeline is
    /// spawned and its task handle returned; the call itself never blocks
    /// on the download.
    #[instrument(skip(self, song), fields(folder_id = %song.folder_id))]
    pub async fn request_download(&self, song: &Song) -> Result<Option<JoinHandle<()>>> {
        if self.store.exists(&song.title).await? {
            debug!("Local archive present, skipping export");
            let path = self.store.path_for(&song.title);
            self.record_local(vec![(song.clone(), path)]).await;
            return Ok(None);
        }

        let registered = self.register(std::slice::from_ref(song));
        let Some(song) = registered.into_iter().next() else {
            // Already in flight; the existing pipeline covers this request.
            return Ok(None);
        };
        Ok(Some(self.spawn_pipeline(song)))
    }

    /// Request a set of songs as one batch.
    ///
    /// The set is partitioned by local existence. An already-downloaded
    /// subset is flushed right away as its own batch (or joins the epoch
    /// currently in flight); the rest are started as independent pipelines
    /// sharing one buffer and one in-flight counter, so the final flush
    /// waits for every member.
    #[instrument(skip(self, songs), fields(count = songs.len()))]
    pub async fn request_batch_download(&self, songs: &[Song]) -> Result<Vec<JoinHandle<()>>> {
        let mut local = Vec::new();
        let mut remote = Vec::new();
        for song in songs {
            if self.store.exists(&song.title).await? {
                let path = self.store.path_for(&song.title);
                local.push((song.clone(), path));
            } else {
                remote.push(song.clone());
            }
        }

        info!(local = local.len(), remote = remote.len(), "Batch partitioned");

        if !local.is_empty() {
            self.record_local(local).await;
        }
        if remote.is_empty() {
            return Ok(Vec::new());
        }

        // Register the whole remainder before spawning anything, so an
        // early finisher cannot observe the counter at zero mid-batch.
        let to_spawn = self.register(&remote);
        Ok(to_spawn
            .into_iter()
            .map(|song| self.spawn_pipeline(song))
            .collect())
    }

    /// Best-effort cleanup hook for the host's foreground transition.
    ///
    /// Re-arms the handoff gate and, when no pipeline is active, clears
    /// stale completed entries left over from a batch that finished while
    /// the application was backgrounded.
    pub fn on_app_foregrounded(&self) {
        self.handoff.on_foreground();

        let mut state = self.state.lock().unwrap();
        if state.in_flight == 0 {
            state.entries.retain(|e| e.status != EntryStatus::Completed);
        }
    }

    /// Current display entries, one per in-flight or recently-completed
    /// download.
    pub fn jobs(&self) -> Vec<DownloadJobEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    /// Whether a local archive is known for this folder key.
    pub fn is_downloaded(&self, folder_id: &str) -> bool {
        self.state.lock().unwrap().downloaded.contains(folder_id)
    }

    /// Whether a pipeline for this folder key is currently registered.
    pub fn is_active(&self, folder_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .any(|e| e.folder_id == folder_id && e.status != EntryStatus::Completed)
    }

    /// Number of pipelines currently in flight.
    pub fn active_count(&self) -> usize {
        self.state.lock().unwrap().in_flight
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Push already-downloaded files into the buffer; flush immediately when
    /// nothing is in flight, otherwise they ride the current epoch.
    async fn record_local(&self, items: Vec<(Song, PathBuf)>) {
        let flush = {
            let mut state = self.state.lock().unwrap();
            for (song, path) in items {
                state.downloaded.insert(song.folder_id.clone());
                state.buffer.push(CompletedDownload {
                    path,
                    title: song.title,
                });
            }
            if state.in_flight == 0 {
                Some(std::mem::take(&mut state.buffer))
            } else {
                None
            }
        };

        if let Some(batch) = flush {
            self.flush(batch).await;
        }
    }

    /// Register entries and bump the in-flight counter for every song not
    /// already being downloaded. Returns the songs that were registered.
    fn register(&self, songs: &[Song]) -> Vec<Song> {
        let mut registered = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            for song in songs {
                if state.entries.iter().any(|e| e.folder_id == song.folder_id) {
                    debug!(folder_id = %song.folder_id, "Download already registered");
                    continue;
                }
                state.entries.push(DownloadJobEntry {
                    folder_id: song.folder_id.clone(),
                    title: song.title.clone(),
                    artist: song.artist.clone(),
                    status: EntryStatus::Queued,
                    percent_done: None,
                });
                state.in_flight += 1;
                registered.push(song.clone());
            }
        }

        for song in &registered {
            self.events
                .emit(CoreEvent::Download(DownloadEvent::Queued {
                    folder_id: song.folder_id.clone(),
                    title: song.title.clone(),
                }))
                .ok();
        }
        registered
    }

    fn spawn_pipeline(&self, song: Song) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            match this.download_song(&song).await {
                Ok(done) => {
                    info!(folder_id = %song.folder_id, path = %done.path.display(), "Download completed");
                    this.events
                        .emit(CoreEvent::Download(DownloadEvent::Completed {
                            folder_id: song.folder_id.clone(),
                            path: done.path.display().to_string(),
                        }))
                        .ok();
                    this.finish(&song.folder_id, Some(done)).await;
                }
                Err(error) => {
                    warn!(folder_id = %song.folder_id, error = %error, "Download failed");
                    this.events
                        .emit(CoreEvent::Download(DownloadEvent::Failed {
                            folder_id: song.folder_id.clone(),
                            message: error.to_string(),
                            timed_out: error.is_timeout(),
                        }))
                        .ok();
                    this.finish(&song.folder_id, None).await;
                }
            }
        })
    }

    /// One song's pipeline: resolve name, export, poll, fetch, persist.
    async fn download_song(&self, song: &Song) -> Result<CompletedDownload> {
        // Name resolution is a label concern only; its failure must not
        // abort the download.
        let archive_name = match self.provider.resolve_display_name(&song.folder_id).await {
            Ok(name) => name,
            Err(error) => {
                warn!(folder_id = %song.folder_id, error = %error, "Display name lookup failed, using catalog title");
                song.title.clone()
            }
        };

        let mut job = ExportJob::start(
            Arc::clone(&self.provider),
            &song.folder_id,
            &archive_name,
            self.config.job_config(),
        )
        .await?;

        self.update_entry(&song.folder_id, job.status(), job.percent_done());

        let archives = job
            .wait_for_terminal(|status, percent_done| {
                self.update_entry(&song.folder_id, status, percent_done);
                self.events
                    .emit(CoreEvent::Download(DownloadEvent::Progress {
                        folder_id: song.folder_id.clone(),
                        status,
                        percent_done,
                    }))
                    .ok();
            })
            .await?;

        let archive = &archives[0];
        let bytes = match timeout(
            self.config.fetch_timeout,
            self.provider.fetch_archive(archive),
        )
        .await
        {
            Ok(result) => result.map_err(DownloadError::from)?,
            Err(_) => {
                return Err(DownloadError::Timeout {
                    limit_secs: self.config.fetch_timeout.as_secs(),
                })
            }
        };

        let path = self.store.write(&song.title, &bytes).await?;
        Ok(CompletedDownload {
            path,
            title: song.title.clone(),
        })
    }

    /// Record one pipeline's outcome and, when the counter reaches zero,
    /// drain the buffer inside the same critical section.
    async fn finish(&self, folder_id: &str, outcome: Option<CompletedDownload>) {
        let flush = {
            let mut state = self.state.lock().unwrap();
            match outcome {
                Some(done) => {
                    if let Some(entry) = state
                        .entries
                        .iter_mut()
                        .find(|e| e.folder_id == folder_id)
                    {
                        entry.status = EntryStatus::Completed;
                        entry.percent_done = Some(100.0);
                    }
                    state.downloaded.insert(folder_id.to_string());
                    state.buffer.push(done);
                }
                None => {
                    // Failed songs leave the visible list; siblings continue.
                    state.entries.retain(|e| e.folder_id != folder_id);
                }
            }

            state.in_flight -= 1;
            if state.in_flight == 0 && !state.buffer.is_empty() {
                Some(std::mem::take(&mut state.buffer))
            } else {
                None
            }
        };

        if let Some(batch) = flush {
            self.flush(batch).await;
            self.schedule_entry_cleanup();
        }
    }

    /// Hand a drained buffer off: directly for one file, recombined into a
    /// single archive for several.
    async fn flush(&self, batch: Vec<CompletedDownload>) {
        debug!(count = batch.len(), "Flushing accumulated downloads");

        if batch.len() == 1 {
            let item = &batch[0];
            self.deliver(&item.path, &item.title).await;
        } else {
            match self.merge_batch(&batch).await {
                Ok(path) => {
                    let title = format!("{} charts", batch.len());
                    self.deliver(&path, &title).await;
                }
                Err(error) => {
                    // Recombination failure falls back to sharing the
                    // member archives; the local files are all intact.
                    warn!(error = %error, "Batch recombination failed, sharing individually");
                    for item in &batch {
                        if let Err(share_error) =
                            self.handoff.share(&item.path, &item.title).await
                        {
                            warn!(error = %share_error, path = %item.path.display(), "Share fallback failed");
                        }
                    }
                    self.events
                        .emit(CoreEvent::Handoff(HandoffEvent::SharedFallback {
                            path: batch[0].path.display().to_string(),
                            reason: error.to_string(),
                        }))
                        .ok();
                }
            }
        }

        self.events
            .emit(CoreEvent::Download(DownloadEvent::BatchFlushed {
                count: batch.len(),
            }))
            .ok();
    }

    async fn deliver(&self, path: &Path, title: &str) {
        match self.handoff.deliver(path, title).await {
            Ok(HandoffOutcome::Delivered) => {
                self.events
                    .emit(CoreEvent::Handoff(HandoffEvent::Delivered {
                        path: path.display().to_string(),
                        title: title.to_string(),
                    }))
                    .ok();
            }
            Ok(HandoffOutcome::Dropped) => {
                self.events
                    .emit(CoreEvent::Handoff(HandoffEvent::Dropped {
                        path: path.display().to_string(),
                    }))
                    .ok();
            }
            Err(error) => {
                warn!(error = %error, "Delivery failed, offering share instead");
                if let Err(share_error) = self.handoff.share(path, title).await {
                    warn!(error = %share_error, "Share fallback failed");
                }
                self.events
                    .emit(CoreEvent::Handoff(HandoffEvent::SharedFallback {
                        path: path.display().to_string(),
                        reason: error.to_string(),
                    }))
                    .ok();
            }
        }
    }

    async fn merge_batch(&self, batch: &[CompletedDownload]) -> Result<PathBuf> {
        let mut sources = Vec::with_capacity(batch.len());
        for item in batch {
            sources.push(self.store.read_path(&item.path).await?);
        }
        let merged = archive::merge_archives(&sources)?;
        self.store.write_named(&store::batch_file_name(), &merged).await
    }

    /// Mirror a poll result into the display entry. The entry keeps its
    /// `Queued` tag until the service reports `IN_PROGRESS`; completion is
    /// set by `finish`, not here.
    fn update_entry(&self, folder_id: &str, status: ExportStatus, percent_done: Option<f32>) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.folder_id == folder_id) {
            if status == ExportStatus::InProgress {
                entry.status = EntryStatus::InProgress;
            }
            entry.percent_done = percent_done;
        }
    }

    /// Completed entries linger briefly for display, then clear, unless a
    /// new pipeline became active in the meantime.
    fn schedule_entry_cleanup(&self) {
        let this = self.clone();
        let grace = self.config.completed_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut state = this.state.lock().unwrap();
            if state.in_flight == 0 {
                state.entries.retain(|e| e.status != EntryStatus::Completed);
            }
        });
    }
}
