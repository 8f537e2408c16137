//! Upstream error types.

use thiserror::Error;

/// Errors from talking to the upstream service.
///
/// Every variant is *indeterminate* from the credential sweeper's point of
/// view: an erroring check never counts as "confirmed invalid" (fail-open).
/// The availability monitor maps every variant to "unavailable".
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The request exceeded its connect or overall timeout.
    #[error("upstream request timed out")]
    Timeout,

    /// DNS failure, refused connection or any other transport error.
    #[error("upstream connection failed: {message}")]
    Connection {
        /// Description of the transport failure.
        message: String,
    },

    /// The upstream answered with a status that signals neither "valid"
    /// nor "invalid" (e.g. a 5xx during maintenance).
    #[error("upstream returned unexpected status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Connection { message: err.to_string() }
        }
    }
}
