//! Error types for the drive export provider

use thiserror::Error;

/// Drive export provider errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// Export API request returned a non-success status
    #[error("Export API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// The embedded folder view page had no usable `<title>` element
    #[error("No title found in embedded folder view for {folder_id}")]
    TitleNotFound { folder_id: String },

    /// Failed to parse an API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for drive export operations
pub type Result<T> = std::result::Result<T, DriveError>;

impl From<DriveError> for bridge_traits::error::BridgeError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::ApiError {
                status_code,
                message,
            } => bridge_traits::error::BridgeError::Http {
                status: status_code,
                body: message,
            },
            DriveError::TitleNotFound { folder_id } => {
                bridge_traits::error::BridgeError::NotAvailable(format!(
                    "No folder title for {}",
                    folder_id
                ))
            }
            DriveError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            DriveError::Bridge(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_error_display() {
        let error = DriveError::ApiError {
            status_code: 500,
            message: "Internal error".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Export API error (status 500): Internal error"
        );
    }

    #[test]
    fn test_api_error_keeps_status_through_conversion() {
        let error = DriveError::ApiError {
            status_code: 429,
            message: "rate limited".to_string(),
        };
        let bridge: BridgeError = error.into();
        assert_eq!(bridge.http_status(), Some(429));
    }
}
