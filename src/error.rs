use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while validating a metadata document.
///
/// Assertion failures are not errors: they are collected as values and end
/// up in the report. Only `Structural` and `Timeout` are recoverable; every
/// other kind aborts the run.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unreadable required input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The metadata bytes are not well-formed XML.
    #[error("failed to parse metadata: {0}")]
    Parse(String),

    /// The document parses but lacks a required element or attribute.
    #[error("{0}")]
    Structural(String),

    /// Network failure or unusable reply from the TLS assessment service.
    #[error("TLS assessment request failed: {0}")]
    Transport(String),

    /// The assessment of `host` did not finish within the wait budget.
    #[error("TLS assessment of {host} did not finish after {}s", waited.as_secs())]
    Timeout { host: String, waited: Duration },

    #[error("run cancelled")]
    Cancelled,

    /// Report tree collision or failure writing the report file.
    #[error("report error: {0}")]
    Report(String),
}

impl Error {
    /// Recoverable kinds are recorded as assertion failures on the running
    /// check instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Structural(_) | Error::Timeout { .. })
    }
}
