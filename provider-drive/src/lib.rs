//! # Drive Export Provider
//!
//! Implements the [`ExportProvider`](bridge_traits::export::ExportProvider)
//! seam against the hosting service's export API.
//!
//! ## Overview
//!
//! This module provides:
//! - Export job creation (`POST {export_base}/exports?key=...`)
//! - Job polling (`GET {export_base}/exports/{id}?key=...`)
//! - Folder display-name resolution via the embedded folder view page
//!   (a `<title>` scrape, much cheaper than a metadata API round-trip)
//! - Archive retrieval from the storage path reported by the job
//!
//! Every request carries the fixed `Referer` header the API requires.
//! Polling calls use [`RetryPolicy::none`](bridge_traits::http::RetryPolicy):
//! the job state machine treats a failed poll as fatal, so the client must
//! not retry underneath it.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::DriveExportConnector;
pub use error::{DriveError, Result};
pub use types::{ExportJobBody, ExportResponse};
