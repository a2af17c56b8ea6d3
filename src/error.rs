//! Error types for oareport.
//!
//! Every failure in this module's enum is fatal for a run. Articles or
//! license-file lines that are merely filtered out are reported as values
//! (see [`crate::license::SkipReason`] and [`crate::normalize::Rejection`]),
//! never through this type.

use thiserror::Error;

/// Main error type for report operations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// XML decoding error from the EFetch payload
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Response was well-formed but lacked something we need
    #[error("Parse error: {0}")]
    Parse(String),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report file writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `ReportError`
pub type Result<T> = std::result::Result<T, ReportError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ReportError::Parse(msg.to_string()))
    }
}
