//! # Download Core
//!
//! The export-and-download pipeline behind the chart downloader:
//!
//! - **Export Job State Machine** (`job`): wraps one remote export request
//!   and polls it to a terminal state
//! - **Download Orchestrator** (`orchestrator`): drives concurrent export
//!   pipelines, accumulates finished archives, and flushes them as a single
//!   handoff once nothing is left in flight
//! - **Local Store** (`store`): title-derived file naming under the
//!   downloads directory; file existence doubles as the downloaded flag
//! - **Archive Recombination** (`archive`): merges a batch of song archives
//!   into one for the single-handoff path

pub mod archive;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod store;

pub use error::{DownloadError, Result};
pub use job::{ExportJob, ExportJobConfig};
pub use orchestrator::{
    DownloadConfig, DownloadJobEntry, DownloadOrchestrator, EntryStatus,
};
pub use store::{sanitized_file_name, DownloadStore, ARCHIVE_EXTENSION};
