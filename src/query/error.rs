//! Error types for metadata query execution.

use thiserror::Error;

/// Errors that can occur while executing a metadata query.
///
/// Any of these is fatal for a run: metadata is a prerequisite for every download.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Endpoint URL could not be parsed.
    #[error("invalid metadata endpoint: {endpoint}")]
    InvalidEndpoint {
        /// The endpoint as configured.
        endpoint: String,
    },

    /// Network-level error talking to the endpoint.
    #[error("network error querying {endpoint}: {source}")]
    Network {
        /// The endpoint being queried.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout querying {endpoint}")]
    Timeout {
        /// The endpoint being queried.
        endpoint: String,
    },

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status} from metadata endpoint {endpoint}: {body}")]
    HttpStatus {
        /// The endpoint being queried.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body, for diagnosis.
        body: String,
    },
}

impl QueryError {
    /// Creates an invalid-endpoint error.
    #[must_use]
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Maps a transport error, promoting timeouts to their own variant.
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.into(),
            }
        } else {
            Self::Network {
                endpoint: endpoint.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }
}
