//! Error types for pagereflow library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagereflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while paginating, sampling or analyzing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON in a report, document or edit script.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The report parsed as JSON but does not have the report shape.
    #[error("Malformed debug report: {0}")]
    ReportShape(String),

    /// Page geometry leaves no room for content.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// An edit referenced a unit that does not exist.
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    /// A reflow pass hit its operation ceiling and was rolled back.
    #[error("Reflow pass did not converge after {operations} operations (limit {limit})")]
    ReflowDiverged {
        /// Operations performed before the pass was aborted
        operations: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// The host executable for the guard does not exist.
    #[error("Host binary not found: {}", .0.display())]
    HostMissing(PathBuf),

    /// The host executable exists but could not be launched.
    #[error("Failed to launch host {}: {source}", .path.display())]
    HostSpawn {
        /// Host executable path
        path: PathBuf,
        /// Underlying launch error
        source: io::Error,
    },

    /// The host session finished without writing a report.
    #[error("Debug report not found: {}", .0.display())]
    ReportMissing(PathBuf),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
