//! Error types for the OAuth token exchange.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which leg of the two-step exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStep {
    /// Refresh token to access token.
    Refresh,
    /// Access token to audience-scoped token.
    Exchange,
}

impl fmt::Display for TokenStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Refresh => "refresh-token grant",
            Self::Exchange => "token exchange",
        })
    }
}

/// Errors that can occur while authorizing access to Vault-managed storage.
///
/// Scoped to a single file's fetch attempt; the orchestrator applies the
/// fail-fast/continue policy.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No refresh token is available, so no exchange can be attempted.
    #[error(
        "[AUTH] Vault access is not configured: {reason}\n  Suggestion: set REFRESH_TOKEN or pass --token-file"
    )]
    NotConfigured {
        /// Why the client is unavailable.
        reason: String,
    },

    /// The refresh token file could not be read.
    #[error("[AUTH] cannot read refresh token from {path}: {source}")]
    TokenFile {
        /// The configured token file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Network-level error talking to the token endpoint.
    #[error("[AUTH] network error during {step}: {source}")]
    Network {
        /// The failed step.
        step: TokenStep,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Token endpoint request timed out.
    #[error("[AUTH] timeout during {step}")]
    Timeout {
        /// The failed step.
        step: TokenStep,
    },

    /// Token endpoint rejected the request.
    #[error("[AUTH] {step} rejected (HTTP {status}): {detail}")]
    Rejected {
        /// The failed step.
        step: TokenStep,
        /// HTTP status code.
        status: u16,
        /// OAuth `error`/`error_description`, when present.
        detail: String,
    },

    /// Response did not carry a usable `access_token`.
    #[error("[AUTH] {step} response has no access token")]
    MissingToken {
        /// The failed step.
        step: TokenStep,
    },

    /// The storage URL has no authority to use as audience.
    #[error("[AUTH] cannot derive token audience from {url}")]
    NoAudience {
        /// The storage URL.
        url: String,
    },
}

impl AuthError {
    /// Creates a `NotConfigured` error.
    #[must_use]
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }

    /// Maps a transport error, promoting timeouts to their own variant.
    #[must_use]
    pub fn transport(step: TokenStep, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { step }
        } else {
            Self::Network { step, source }
        }
    }
}
