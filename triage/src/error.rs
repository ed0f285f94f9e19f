//! Report error types
//!
//! Every variant here is fatal to a run: nothing downstream of the parser
//! or aggregator runs when one is returned.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while loading, decoding or aggregating a test report
#[derive(Error, Debug)]
pub enum ReportError {
    /// The report document does not exist
    #[error("Test report not found at {path}. Run the tests first.")]
    NotFound { path: PathBuf },

    /// The report exists but could not be read
    #[error("Failed to read test report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not a structurally valid test report
    #[error("Malformed test report: {reason}")]
    Malformed { reason: String },

    /// Declared failures and errors exceed the declared test count
    #[error(
        "Inconsistent report totals: {failures} failures + {errors} errors exceed {tests} tests"
    )]
    InconsistentTotals {
        tests: u64,
        failures: u64,
        errors: u64,
    },
}

impl ReportError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
