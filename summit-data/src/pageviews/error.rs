//! Errors raised while fetching page views.

use thiserror::Error;

/// Errors produced by a single page-view lookup.
///
/// These never leave the [`summit_core::SignalSource`] boundary: the source
/// logs them and reports the signal as undefined.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignalFetchError {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Fully qualified request URL.
        url: String,
        /// Error message returned by the client.
        message: String,
    },
    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs} seconds")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an error status.
    #[error("request to {url} failed with status {status}")]
    Status {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The service kept rate-limiting after every permitted retry.
    #[error("request to {url} was still rate limited after {attempts} attempts")]
    RateLimited {
        /// Fully qualified request URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },
    /// The response body was not the expected JSON.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Fully qualified request URL.
        url: String,
        /// Decoder error message.
        message: String,
    },
    /// The article title could not be placed in a request URL.
    #[error("cannot build a page-view URL from base {base_url}")]
    InvalidUrl {
        /// Configured base URL.
        base_url: String,
    },
}
