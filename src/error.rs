use thiserror::Error;

/// Message shown when the service gives no reason for a failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to load recommendations. Please try again.";

/// Errors that can occur while talking to the recommendation service
#[derive(Error, Debug)]
pub enum RecsError {
    /// Transport-level failure (connection refused, timeout, bad body)
    #[error("Failed to reach recommendation service: {0}")]
    FetchError(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Recommendation service returned {status}{}", detail_suffix(.detail))]
    ApiError {
        status: u16,
        /// Value of the `detail` field of the error body, if any
        detail: Option<String>,
    },

    /// No user id in local storage; caller should send the user to login
    #[error("No signed-in user")]
    MissingIdentity,

    /// Local storage could not be read or written
    #[error("Local storage error: {0}")]
    StoreError(#[from] std::io::Error),

    /// Local storage or a response body held malformed JSON
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// CSV file could not be written
    #[error("Export failed: {0}")]
    ExportError(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl RecsError {
    /// Human readable message for the error banner.
    ///
    /// Prefers the server supplied `detail`, falling back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            RecsError::ApiError {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
