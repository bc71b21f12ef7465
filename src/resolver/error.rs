//! Error types for metadata resolution.
//!
//! Every resolution error is fatal for the run: without a version literal and
//! a non-empty file list there is nothing meaningful to download.

use thiserror::Error;

use crate::identifier::IdentifierError;
use crate::query::QueryError;

/// Errors that can occur while resolving an identifier into files.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input could not be parsed or classified.
    #[error(transparent)]
    MalformedIdentifier(#[from] IdentifierError),

    /// The metadata endpoint could not be queried.
    #[error("metadata query failed: {0}")]
    QueryExecution(#[from] QueryError),

    /// Queries succeeded but produced no usable version or files.
    #[error("resolution failed for '{input}': {reason}\n  Suggestion: {suggestion}")]
    ResolutionFailed {
        /// The identifier being resolved.
        input: String,
        /// Why resolution failed.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },
}

impl ResolveError {
    /// Creates a `ResolutionFailed` error.
    #[must_use]
    pub fn resolution_failed(input: &str, reason: &str) -> Self {
        let suggestion = match reason {
            "no files resolved" => {
                "Check that the version exists and has files attached, or pass --endpoint"
            }
            "could not determine version" => "Pass --dataset-version explicitly for file IRIs",
            _ => "Check the identifier and the metadata endpoint",
        };
        Self::ResolutionFailed {
            input: input.to_string(),
            reason: reason.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}
