//! # Desktop Bridge Adapters
//!
//! Desktop-ready implementations of the `bridge-traits` capabilities:
//!
//! - [`ReqwestHttpClient`] - HTTP over reqwest with exponential backoff
//! - [`NativeFileStore`] - downloads directory on the local filesystem
//! - [`CommandHandoff`] - archive delivery through a configurable opener
//!   command, wrapped in the handoff gate by the service bootstrap
//!
//! Mobile hosts ship their own adapter crates; nothing here is referenced
//! from the core directly, only injected through `CoreConfig`.

pub mod files;
pub mod handoff;
pub mod http;

pub use files::{default_downloads_dir, NativeFileStore};
pub use handoff::CommandHandoff;
pub use http::ReqwestHttpClient;
