//! # Core Runtime
//!
//! Ambient infrastructure shared by the download core:
//!
//! - **Configuration** (`config`): builder-validated [`CoreConfig`] holding
//!   bridge dependencies, the downloads directory, and export API settings
//! - **Events** (`events`): typed [`EventBus`](events::EventBus) the host UI
//!   subscribes to for job-list and notification updates
//! - **Logging** (`logging`): `tracing-subscriber` bootstrap

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, DriveApiConfig};
pub use error::{Error, Result};
pub use events::{CoreEvent, DownloadEvent, EventBus, EventSeverity, HandoffEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
