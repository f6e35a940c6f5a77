//! Output Handoff through a desktop opener command
//!
//! The mobile hosts launch the companion application through a platform
//! intent; on the desktop the closest equivalent is handing the archive to
//! a configurable opener command (`xdg-open` by default, or the companion
//! app binary when installed). The share fallback opens the containing
//! directory so the user can pass the file along manually.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    handoff::{HandoffOutcome, OutputHandoff},
};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Command-launching handoff adapter
pub struct CommandHandoff {
    /// Program receiving the archive path on delivery
    opener: String,
    /// Program receiving the containing directory on share
    sharer: String,
}

impl CommandHandoff {
    /// Use `xdg-open` for both delivery and share.
    pub fn new() -> Self {
        Self {
            opener: "xdg-open".to_string(),
            sharer: "xdg-open".to_string(),
        }
    }

    /// Deliver through a specific program (e.g. the companion app binary).
    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = opener.into();
        self
    }

    pub fn with_sharer(mut self, sharer: impl Into<String>) -> Self {
        self.sharer = sharer.into();
        self
    }

    async fn spawn(program: &str, arg: &Path) -> Result<()> {
        let status = Command::new(program)
            .arg(arg)
            .status()
            .await
            .map_err(|e| BridgeError::NotAvailable(format!("{program}: {e}")))?;

        if !status.success() {
            return Err(BridgeError::OperationFailed(format!(
                "{program} exited with {status}"
            )));
        }
        Ok(())
    }
}

impl Default for CommandHandoff {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandoff for CommandHandoff {
    async fn deliver(&self, archive: &Path, title: &str) -> Result<HandoffOutcome> {
        debug!(archive = %archive.display(), title, "Delivering archive");
        Self::spawn(&self.opener, archive).await?;
        Ok(HandoffOutcome::Delivered)
    }

    async fn share(&self, archive: &Path, title: &str) -> Result<()> {
        let target = archive.parent().unwrap_or(archive);
        warn!(archive = %archive.display(), title, "Offering share fallback");
        Self::spawn(&self.sharer, target).await
    }
}
