//! Error types for the status dashboard

use std::fmt;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// The only failure text ever shown on screen.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load status data";

#[derive(Debug)]
pub enum DashboardError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Status endpoint answered with a non-success code
    Status(u16),

    /// Request did not complete within the configured timeout
    Timeout,

    /// Terminal setup or drawing failed
    Terminal(String),

    /// Generic error with message
    Other(String),
}

impl DashboardError {
    /// Text shown to the user, independent of the underlying cause.
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILED_MESSAGE
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Io(err) => write!(f, "IO error: {}", err),
            DashboardError::Http(err) => write!(f, "HTTP error: {}", err),
            DashboardError::Json(err) => write!(f, "JSON error: {}", err),
            DashboardError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DashboardError::Status(code) => write!(f, "Status endpoint returned {}", code),
            DashboardError::Timeout => write!(f, "Status request timed out"),
            DashboardError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
            DashboardError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Io(err) => Some(err),
            DashboardError::Http(err) => Some(err),
            DashboardError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Io(err)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DashboardError::Timeout
        } else {
            DashboardError::Http(err)
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Json(err)
    }
}
