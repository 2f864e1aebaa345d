//! Error types for collector reporting.

use http::StatusCode;

/// Invalid or missing reporter configuration.
///
/// Returned from constructors; the reporter never starts without a usable
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No API key was given and `REQ402_API_KEY` is unset or blank.
    #[error("req402 API key is required: pass it explicitly or set REQ402_API_KEY")]
    MissingApiKey,
    /// The API key cannot be sent as an HTTP header value.
    #[error("req402 API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
    /// The backend URL could not be parsed or joined with the webhook path.
    #[error("invalid backend URL {url:?}: {source}")]
    InvalidBackendUrl {
        /// The offending URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The timeout value is not a whole number of seconds.
    #[error("invalid timeout {value:?}: expected whole seconds")]
    InvalidTimeout {
        /// The offending value.
        value: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// Failure of a single delivery attempt.
///
/// The dispatcher discards these; they exist so the outcome is observable in
/// tests and logs.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The collector did not answer within the configured timeout.
    #[error("collector request timed out: {source}")]
    Timeout {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Transport-level failure (DNS, connect, TLS, body encoding).
    #[error("collector request failed: {source}")]
    Http {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The collector answered with a non-success status.
    #[error("collector returned HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body, empty if it could not be read.
        body: String,
    },
}

impl From<reqwest::Error> for ReportError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { source }
        } else {
            Self::Http { source }
        }
    }
}
