//! Error types for panreport
//!
//! The pipeline distinguishes three failure classes:
//! - transport failures (connection, timeout): fatal while initiating a job,
//!   absorbed by the bounded poll loop afterwards
//! - malformed or unexpected response shapes: fatal while initiating,
//!   another poll attempt otherwise
//! - semantic absence (no job identifier, empty result payload): always a
//!   distinct, catchable error

use thiserror::Error;

/// Result type alias for panreport operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for panreport
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "hostname")
        key: Option<String>,
    },

    /// Network error outside the job lifecycle (result fetch, op commands)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The appliance answered an op command with a non-success HTTP status
    #[error("appliance returned HTTP {status}")]
    UnexpectedStatus {
        /// The HTTP status code the appliance returned
        status: u16,
    },

    /// Report job failure (initiation or polling)
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Result flattening failure
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Job lifecycle errors
///
/// Each variant names a distinct failure cause, so callers can branch on the
/// reason instead of re-deriving it from log output. Initiation returns
/// `Transport`, `HttpStatus`, `MalformedResponse` or `MissingJobId`; the
/// poller only ever fails with `Exhausted`.
#[derive(Debug, Error)]
pub enum JobError {
    /// Network failure while talking to the appliance
    #[error("network error while initiating job: {0}")]
    Transport(#[from] reqwest::Error),

    /// The appliance answered with a non-200 status
    #[error("failed to initiate job: HTTP {0}")]
    HttpStatus(u16),

    /// The response body was not parseable XML
    #[error("error parsing XML response: {0}")]
    MalformedResponse(String),

    /// The response parsed but carried no job identifier
    #[error("no job element found in response")]
    MissingJobId,

    /// The poll ceiling was reached without a successful completion
    #[error("job did not complete within {attempts} attempts")]
    Exhausted {
        /// Number of status probes performed before giving up
        attempts: u32,
    },
}

/// Result flattening errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// The result payload contained no record entries
    ///
    /// Header derivation needs a first record; an empty payload is reported
    /// as this error instead of an out-of-range access.
    #[error("result payload contains no entries")]
    NoEntries,

    /// The result payload was not parseable XML
    #[error("error parsing result payload: {0}")]
    MalformedPayload(String),
}
