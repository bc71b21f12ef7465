//! Databus Core Library
//!
//! Resolves DBpedia Databus identifiers into concrete file sets and downloads
//! them, including files kept in token-protected Vault storage.
//!
//! # Architecture
//!
//! - [`identifier`] - Parse and classify Databus IRIs
//! - [`query`] - SPARQL query builders, executor, and TSV decoding
//! - [`resolver`] - Identifier + version selector into a file set
//! - [`download`] - Redirect probing, storage classification, streaming fetch
//! - [`auth`] - Refresh-token discovery and OAuth token exchange
//! - [`layout`] - On-disk destination paths

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod download;
pub mod http_client;
pub mod identifier;
pub mod layout;
pub mod query;
pub mod resolver;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use auth::{AuthError, RefreshTokenSource, TokenExchangeClient};
pub use download::{
    DownloadError, DownloadOrchestrator, DownloadOutcome, HttpClient, OutcomeStatus,
    RedirectProber, RunOptions, RunSummary, VaultAuthorities,
};
pub use http_client::HttpTimeouts;
pub use identifier::{DatabusIdentifier, Granularity, IdentifierError};
pub use query::{QueryError, QueryExecutor, SparqlHttpExecutor};
pub use resolver::{MetadataResolver, ResolveError, ResolvedFileSet, VersionSelector};
