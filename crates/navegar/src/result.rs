//! Result and error types for Navegar.

use thiserror::Error;

/// Result type for Navegar operations
pub type NavegarResult<T> = Result<T, NavegarError>;

/// Errors that can occur while driving a journey
#[derive(Debug, Error)]
pub enum NavegarError {
    /// Bad or missing configuration (account keys, feature sets, flags)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A page's defining element never became present within the bounded wait
    #[error("Page '{page}' not ready: '{selector}' not present after {ms}ms")]
    PageNotReady {
        /// Page object name
        page: String,
        /// Defining selector that was waited on
        selector: String,
        /// Bounded wait in milliseconds
        ms: u64,
    },

    /// The underlying automation call failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Bounded wait elapsed without the condition holding
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Screenshot capture or persistence failed
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Video recording failed
    #[error("Video recording failed: {message}")]
    VideoRecording {
        /// Error message
        message: String,
    },

    /// Severe entries were found in the browser console
    #[error("Browser console reported {count} error(s), first: {sample}")]
    ConsoleErrors {
        /// Number of severe entries
        count: usize,
        /// Text of the first severe entry
        sample: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl NavegarError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}
