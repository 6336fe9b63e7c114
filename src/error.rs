//! Error types for the STF monitor.

use crate::report::ReportPhase;
use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while classifying, aggregating or pushing.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vendor table CSV error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Envelope or payload JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The handshake field index is beyond the end of the tokenized line.
    #[error(
        "Malformed line for vendor '{vendor}': field {index} requested but only {fields} present: {line:?}"
    )]
    MalformedLine {
        vendor: String,
        line: String,
        index: usize,
        fields: usize,
    },

    /// A line in the batch cannot be interpreted at all.
    #[error("Inconsistent batch for vendor '{vendor}': {reason}: {line:?}")]
    InconsistentBatch {
        vendor: String,
        line: String,
        reason: String,
    },

    /// No profile is registered under this identifier.
    #[error("Unknown vendor '{0}'")]
    UnknownVendor(String),

    /// Invalid row in the vendor table
    #[error("Invalid vendor record at row {row}: {message}")]
    InvalidVendorRecord { row: usize, message: String },

    /// Report builder driven out of order
    #[error("Cannot {action} a sensor report in phase {phase:?}")]
    InvalidTransition {
        phase: ReportPhase,
        action: &'static str,
    },

    /// Envelope carries neither `services` nor `vendors`
    #[error("Envelope contains no services or vendors")]
    MissingEnvelope,
}

impl MonitorError {
    /// Returns `true` for errors that only invalidate a single vendor run.
    pub fn is_run_scoped(&self) -> bool {
        matches!(
            self,
            MonitorError::MalformedLine { .. } | MonitorError::InconsistentBatch { .. }
        )
    }
}
