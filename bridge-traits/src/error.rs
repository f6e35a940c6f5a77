use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// Non-success HTTP status. The body is kept so callers can surface the
    /// service's own error message.
    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// HTTP status code, if this error carries one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            BridgeError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
