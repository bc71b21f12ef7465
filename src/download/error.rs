//! Error types for the download module.
//!
//! Every variant is scoped to a single file. The orchestrator turns them into
//! per-file outcomes and decides whether the run continues.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur while fetching one file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Storage refused the request (401/403).
    #[error(
        "[AUTH] access denied by {domain} (HTTP {status}) downloading {url}\n  Suggestion: {suggestion}"
    )]
    AccessDenied {
        /// The URL that was refused.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The refusing host.
        domain: String,
        /// What the user can do about it.
        suggestion: &'static str,
    },

    /// File system error (create directory, create file, write, ...).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// URL has no final path segment to name the local file after.
    #[error("cannot derive a filename from {url}")]
    NoFilename {
        /// The URL without a usable final segment.
        url: String,
    },

    /// Token acquisition for a Vault-managed file failed.
    #[error("{source}")]
    Auth {
        /// The file being fetched.
        url: String,
        /// The underlying auth failure.
        #[source]
        source: AuthError,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a missing-filename error.
    pub fn no_filename(url: impl Into<String>) -> Self {
        Self::NoFilename { url: url.into() }
    }

    /// Wraps a token failure for `url`.
    pub fn auth(url: impl Into<String>, source: AuthError) -> Self {
        Self::Auth {
            url: url.into(),
            source,
        }
    }

    /// Creates an access-denied error.
    ///
    /// A Bearer request that is refused points at the token; an anonymous one
    /// usually means the host is a Vault that is not in the authority list.
    pub fn access_denied(
        url: impl Into<String>,
        status: u16,
        domain: impl Into<String>,
        had_bearer: bool,
    ) -> Self {
        let suggestion = if had_bearer {
            "Check that the refresh token is valid and grants access to this host."
        } else {
            "If this host is a Vault, add it with --vault-authority."
        };
        Self::AccessDenied {
            url: url.into(),
            status,
            domain: domain.into(),
            suggestion,
        }
    }

    /// Whether this failure came from token acquisition or an access refusal.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::AccessDenied { .. })
    }
}
