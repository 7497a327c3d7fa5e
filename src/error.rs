//! Error types for MBP-10 reconstruction.
//!
//! Record-level errors never escape the core: the event processor turns them
//! into suppressions (see [`SkipReason`]). I/O errors from sources, sinks and
//! the CLI propagate through [`Result`].

use thiserror::Error;

use crate::types::SkipReason;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, MbpError>;

/// Main error type for reconstruction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MbpError {
    /// Record has fewer fields than the layout requires
    #[error("Malformed record: expected at least {expected} fields, found {found}")]
    MalformedRecord { expected: usize, found: usize },

    /// Action field empty or not one of `R|A|C|T|F`
    #[error("Invalid action: {0:?}")]
    InvalidAction(Option<char>),

    /// Side field empty
    #[error("Missing side")]
    MissingSide,

    /// A numeric field failed to parse
    #[error("Invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Ledger and registry disagree
    #[error("Book inconsistency: {0}")]
    InconsistentState(String),

    /// I/O failure in a source or sink
    #[error("IO error: {0}")]
    Io(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl MbpError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        MbpError::Generic(msg.into())
    }

    /// Suppression reason for a record-level error.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            MbpError::InvalidAction(_) => SkipReason::UnknownAction,
            MbpError::InvalidNumber { .. } => SkipReason::InvalidNumber,
            _ => SkipReason::Malformed,
        }
    }
}

impl From<std::io::Error> for MbpError {
    fn from(err: std::io::Error) -> Self {
        MbpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MbpError {
    fn from(err: serde_json::Error) -> Self {
        MbpError::Generic(format!("JSON error: {err}"))
    }
}

impl From<String> for MbpError {
    fn from(err: String) -> Self {
        MbpError::Generic(err)
    }
}

impl From<&str> for MbpError {
    fn from(err: &str) -> Self {
        MbpError::Generic(err.to_string())
    }
}
