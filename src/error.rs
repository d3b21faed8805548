//! Error types for the capture runner

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing diagrams
#[derive(Error, Debug)]
pub enum Error {
    /// The HTML document to render does not exist
    #[error("HTML file does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    /// Failed to launch the browser
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    /// Failed to load the document
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// The element did not appear before the wait timed out
    #[error("Element {selector} did not appear within {timeout_ms}ms: {detail}")]
    ElementTimeout {
        selector: String,
        timeout_ms: u64,
        detail: String,
    },

    /// The element lookup returned nothing
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Failed to capture the element
    #[error("Screenshot failed: {0}")]
    CaptureError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The browser worker went away before answering
    #[error("Browser worker unavailable: {0}")]
    WorkerGone(String),
}

impl Error {
    /// True for errors that are contained to a single target.
    pub fn is_per_target(&self) -> bool {
        matches!(
            self,
            Error::ElementTimeout { .. } | Error::ElementNotFound(_) | Error::CaptureError(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_target_classification() {
        assert!(Error::ElementNotFound("#a".into()).is_per_target());
        assert!(Error::CaptureError("boom".into()).is_per_target());
        assert!(Error::ElementTimeout {
            selector: "#a".into(),
            timeout_ms: 10,
            detail: "timeout".into()
        }
        .is_per_target());
        assert!(!Error::LoadError("nope".into()).is_per_target());
        assert!(!Error::InputMissing(PathBuf::from("x.html")).is_per_target());
    }

    #[test]
    fn input_missing_message_names_path() {
        let msg = Error::InputMissing(PathBuf::from("docs/diagrams.html")).to_string();
        assert!(msg.contains("docs/diagrams.html"));
    }
}
