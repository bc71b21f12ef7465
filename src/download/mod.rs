//! Fetching resolved Databus files.
//!
//! For every file URL the orchestrator:
//!
//! - probes for a one-hop redirect ([`RedirectProber`])
//! - classifies the storage as direct or Vault-managed ([`classify`])
//! - obtains a Bearer token for Vault storage
//! - streams the body to disk ([`HttpClient`])
//!
//! # Example
//!
//! ```no_run
//! use databus_core::HttpTimeouts;
//! use databus_core::download::{
//!     DEFAULT_VAULT_AUTHORITIES, DownloadOrchestrator, HttpClient, RedirectProber, RunOptions,
//!     VaultAuthorities,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeouts = HttpTimeouts::default();
//! let orchestrator = DownloadOrchestrator::new(
//!     HttpClient::new(timeouts)?,
//!     RedirectProber::new(timeouts)?,
//!     VaultAuthorities::new(DEFAULT_VAULT_AUTHORITIES),
//! );
//! let urls = vec!["https://example.org/u/g/a/1.0/a.ttl".to_string()];
//! let summary = orchestrator
//!     .run(&urls, Path::new("./u/g/a/1.0"), RunOptions::default())
//!     .await?;
//! println!("{} downloaded, {} failed", summary.success_count(), summary.failure_count());
//! # Ok(())
//! # }
//! ```

mod classify;
mod client;
mod error;
pub(crate) mod filename;
mod orchestrator;
mod probe;

pub use classify::{DEFAULT_VAULT_AUTHORITIES, StorageTarget, VaultAuthorities, classify};
pub use client::{DownloadFileResult, HttpClient};
pub use error::DownloadError;
pub use orchestrator::{
    DownloadOrchestrator, DownloadOutcome, OutcomeStatus, RunOptions, RunProgress, RunSummary,
};
pub use probe::{RedirectProbeResult, RedirectProber};
