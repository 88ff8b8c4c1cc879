//! Client error types shared by the backend and image store clients.

/// Message shown to users when a request fails without a usable backend message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors from talking to the backend or the image store.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Build from a reqwest transport error. The original error is logged.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        tracing::warn!(error = %err, "HTTP request failed");
        if err.is_timeout() {
            Self::Network(format!("Request timed out after {timeout_secs}s"))
        } else if err.is_connect() {
            Self::Network("Could not reach the server".to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Backend-provided messages win; transport details are replaced by a
    /// generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => self.to_string(),
            Self::Http { message, .. } | Self::Rejected(message) if !message.is_empty() => {
                message.clone()
            }
            Self::Validation(message) => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// The backend's own message, if this error carries one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } | Self::Rejected(message) | Self::Validation(message)
                if !message.is_empty() =>
            {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
