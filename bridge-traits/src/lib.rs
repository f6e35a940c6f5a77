//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the download core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be provided differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry policies
//! - [`FileStore`](files::FileStore) - Flat-file persistence for downloaded archives
//!
//! ### Remote Export
//! - [`ExportProvider`](export::ExportProvider) - The file-hosting export API seam:
//!   display-name resolution, export creation, polling, archive retrieval
//!
//! ### Platform Integration
//! - [`OutputHandoff`](handoff::OutputHandoff) - Delivery of finished archives to the
//!   companion application (or a generic share action)
//! - [`HandoffGate`](handoff::HandoffGate) - Single-slot lock serializing handoff attempts
//! - [`LifecycleObserver`](lifecycle::LifecycleObserver) - App foreground/background transitions
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing; see `core-runtime`'s configuration builder for the
//! `CapabilityMissing` pattern.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError`
//! and preserve HTTP status information via [`BridgeError::Http`] so callers
//! can classify failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared freely across async tasks.

pub mod error;
pub mod export;
pub mod files;
pub mod handoff;
pub mod http;
pub mod lifecycle;

pub use error::BridgeError;

// Re-export commonly used types
pub use export::{ExportProvider, ExportSnapshot, ExportStatus, RemoteArchive};
pub use files::FileStore;
pub use handoff::{GatedHandoff, HandoffGate, HandoffOutcome, OutputHandoff};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use lifecycle::{LifecycleEvents, LifecycleObserver, LifecycleState};
