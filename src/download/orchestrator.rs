//! Sequential download of a resolved file set.
//!
//! Files are processed one at a time in the given order: probe, classify,
//! optionally authenticate, fetch. Each file yields a [`DownloadOutcome`];
//! the run yields a [`RunSummary`] whether it finished, aborted on the first
//! failure, or was interrupted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{error, info, instrument, warn};
use url::Url;

use super::classify::{StorageTarget, VaultAuthorities, classify};
use super::client::{DownloadFileResult, HttpClient};
use super::error::DownloadError;
use super::probe::RedirectProber;
use crate::auth::{AuthError, TokenExchangeClient};
use crate::http_client::url_authority;

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop at the first failed file instead of continuing.
    pub fail_fast: bool,
    /// Report what would be fetched without touching the network or disk.
    pub dry_run: bool,
}

/// Final state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// File written to disk.
    Success,
    /// Probe, auth, or transfer failed.
    Failed,
}

/// Result for a single file URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// The file URL as resolved.
    pub url: String,
    /// Success or failure.
    pub status: OutcomeStatus,
    /// Where the file was written, on success.
    pub path: Option<PathBuf>,
    /// Human-readable failure description, on failure.
    pub error_detail: Option<String>,
}

impl DownloadOutcome {
    fn success(url: &str, path: PathBuf) -> Self {
        Self {
            url: url.to_string(),
            status: OutcomeStatus::Success,
            path: Some(path),
            error_detail: None,
        }
    }

    fn failed(url: &str, error: &DownloadError) -> Self {
        Self {
            url: url.to_string(),
            status: OutcomeStatus::Failed,
            path: None,
            error_detail: Some(error.to_string()),
        }
    }
}

/// Aggregate result of a run.
///
/// `outcomes` holds one entry per attempted file, in order. Files never
/// attempted (dry run, abort, interrupt) are counted in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    outcomes: Vec<DownloadOutcome>,
    skipped: usize,
    aborted: bool,
    interrupted: bool,
}

impl RunSummary {
    /// Per-file outcomes in processing order.
    #[must_use]
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Number of files written.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Success)
            .count()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// URLs of failed files, in processing order.
    #[must_use]
    pub fn failed_urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Failed)
            .map(|outcome| outcome.url.as_str())
            .collect()
    }

    /// Files never attempted.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether fail-fast stopped the run early.
    #[must_use]
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    /// Whether an interrupt stopped the run early.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }
}

/// Live counters for progress display.
#[derive(Debug, Default)]
pub struct RunProgress {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl RunProgress {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Files failed so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    fn record(&self, status: OutcomeStatus) {
        let counter = match status {
            OutcomeStatus::Success => &self.completed,
            OutcomeStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Drives probe, classification, token exchange, and fetch for each file.
#[derive(Debug)]
pub struct DownloadOrchestrator {
    client: HttpClient,
    prober: RedirectProber,
    vault: VaultAuthorities,
    tokens: Option<TokenExchangeClient>,
    interrupted: Option<Arc<AtomicBool>>,
    progress: Option<Arc<RunProgress>>,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator without Vault credentials.
    #[must_use]
    pub fn new(client: HttpClient, prober: RedirectProber, vault: VaultAuthorities) -> Self {
        Self {
            client,
            prober,
            vault,
            tokens: None,
            interrupted: None,
            progress: None,
        }
    }

    /// Enables Vault downloads with the given token client.
    #[must_use]
    pub fn with_token_client(mut self, tokens: Option<TokenExchangeClient>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Checks `flag` before each file and stops once it is set.
    #[must_use]
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(flag);
        self
    }

    /// Publishes per-file results to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<RunProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Downloads `file_urls` into `destination_dir`.
    ///
    /// The directory is created (idempotently) before the first file. Per-file
    /// failures never surface as `Err`; they are recorded in the summary.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] only if the destination directory cannot
    /// be created.
    #[instrument(
        skip(self, file_urls, destination_dir),
        fields(files = file_urls.len(), dir = %destination_dir.display())
    )]
    pub async fn run(
        &self,
        file_urls: &[String],
        destination_dir: &Path,
        options: RunOptions,
    ) -> Result<RunSummary, DownloadError> {
        let mut summary = RunSummary::default();

        if options.dry_run {
            for url in file_urls {
                info!(url = %url, dir = %destination_dir.display(), "dry run: would download");
            }
            summary.skipped = file_urls.len();
            return Ok(summary);
        }

        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| DownloadError::io(destination_dir, e))?;

        for (index, url) in file_urls.iter().enumerate() {
            if self.is_interrupted() {
                warn!(remaining = file_urls.len() - index, "interrupted, stopping");
                summary.interrupted = true;
                summary.skipped = file_urls.len() - index;
                break;
            }

            let outcome = match self.download_one(url, destination_dir).await {
                Ok(path) => DownloadOutcome::success(url, path),
                Err(error) => {
                    error!(
                        url = %url,
                        error = %error,
                        auth = error.is_auth_failure(),
                        "download failed"
                    );
                    DownloadOutcome::failed(url, &error)
                }
            };
            let status = outcome.status;
            if let Some(progress) = &self.progress {
                progress.record(status);
            }
            summary.outcomes.push(outcome);

            if status == OutcomeStatus::Failed && options.fail_fast {
                summary.aborted = true;
                summary.skipped = file_urls.len() - index - 1;
                warn!(skipped = summary.skipped, "aborting after first failure");
                break;
            }
        }

        info!(
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            skipped = summary.skipped,
            "run finished"
        );
        Ok(summary)
    }

    async fn download_one(
        &self,
        url: &str,
        destination_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let probe = self.prober.probe(&parsed).await;

        let result = match classify(&parsed, &probe, &self.vault) {
            StorageTarget::Direct(target) => {
                self.client
                    .download_to_file(target.as_str(), destination_dir)
                    .await?
            }
            StorageTarget::VaultManaged(location) => {
                self.download_from_vault(url, &location, destination_dir)
                    .await?
            }
        };
        Ok(result.path)
    }

    /// Fetches a Vault-managed file with a Bearer token.
    ///
    /// A cached token that storage refuses is dropped and the file is retried
    /// once with a freshly exchanged token.
    async fn download_from_vault(
        &self,
        url: &str,
        location: &Url,
        destination_dir: &Path,
    ) -> Result<DownloadFileResult, DownloadError> {
        let (tokens, audience) = self.vault_audience(url, location)?;
        let was_cached = tokens.has_cached_token(&audience);
        let token = tokens
            .obtain_access_token(&audience)
            .await
            .map_err(|source| DownloadError::auth(url, source))?;

        match self
            .client
            .download_to_file_with_bearer(location.as_str(), destination_dir, &token)
            .await
        {
            Err(DownloadError::AccessDenied { status, .. }) if was_cached => {
                warn!(%audience, status, "cached vault token refused, exchanging again");
                tokens.invalidate(&audience);
                let token = tokens
                    .obtain_access_token(&audience)
                    .await
                    .map_err(|source| DownloadError::auth(url, source))?;
                self.client
                    .download_to_file_with_bearer(location.as_str(), destination_dir, &token)
                    .await
            }
            result => result,
        }
    }

    fn vault_audience(
        &self,
        url: &str,
        location: &Url,
    ) -> Result<(&TokenExchangeClient, String), DownloadError> {
        let tokens = self.tokens.as_ref().ok_or_else(|| {
            DownloadError::auth(
                url,
                AuthError::not_configured(format!("{url} redirects to Vault storage")),
            )
        })?;
        let audience = url_authority(location).ok_or_else(|| {
            DownloadError::auth(
                url,
                AuthError::NoAudience {
                    url: location.to_string(),
                },
            )
        })?;
        Ok((tokens, audience))
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
