use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures of a single download pipeline.
///
/// Each per-song pipeline catches its own error; nothing here crosses over
/// to sibling downloads. The display strings double as the user-visible
/// failure notices, so they name the reason rather than the call site.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The export service answered with a non-success HTTP status.
    #[error("HTTP error (status {status}): {message}")]
    Network { status: u16, message: String },

    /// The archive fetch exceeded its time limit and was aborted.
    #[error("Download timed out ({limit_secs}s limit)")]
    Timeout { limit_secs: u64 },

    /// The export job succeeded but produced no archives.
    #[error("No archives generated")]
    EmptyResult,

    /// The export job reported FAILED.
    #[error("Export job failed")]
    JobFailed,

    /// The export job never reached a terminal status within the deadline.
    #[error("Export job stuck: not finished after {waited_secs}s")]
    Stuck { waited_secs: u64 },

    /// Recombining batch archives failed.
    #[error("Archive recombination failed: {0}")]
    Archive(String),

    /// Local persistence failed.
    #[error("File store error: {0}")]
    Store(String),

    /// Any other bridge-level failure (connection errors, parse errors).
    #[error(transparent)]
    Provider(BridgeError),
}

impl DownloadError {
    /// Whether this failure is the archive-fetch timeout. Hosts report that
    /// case distinctly from other network failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DownloadError::Timeout { .. })
    }
}

impl From<BridgeError> for DownloadError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Http { status, body } => DownloadError::Network {
                status,
                message: body,
            },
            other => DownloadError::Provider(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_bridge_error_becomes_network() {
        let err: DownloadError = BridgeError::Http {
            status: 500,
            body: "Internal Server Error".to_string(),
        }
        .into();

        assert!(matches!(err, DownloadError::Network { status: 500, .. }));
    }

    #[test]
    fn test_other_bridge_errors_stay_provider() {
        let err: DownloadError = BridgeError::OperationFailed("connect failed".to_string()).into();
        assert!(matches!(err, DownloadError::Provider(_)));
    }

    #[test]
    fn test_timeout_message_is_distinct() {
        let err = DownloadError::Timeout { limit_secs: 90 };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Download timed out (90s limit)");
        assert!(!DownloadError::JobFailed.is_timeout());
    }
}
