use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use databus_core::download::{DownloadOrchestrator, HttpClient, RedirectProber, RunProgress};
use databus_core::{
    DatabusIdentifier, MetadataResolver, RunOptions, SparqlHttpExecutor, TokenExchangeClient,
    layout,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{exit_handler, output, progress, terminal};
use crate::cli::Args;
use crate::config::{self, Settings};

pub(crate) async fn run_databus_dl() -> Result<ProcessExit> {
    let args = Args::parse();

    let no_color = terminal::is_no_color_requested(args.no_color);
    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet), no_color);
    debug!(?args, "CLI arguments parsed");

    let file_config = config::load_default_file_config()?;
    let settings = config::resolve_settings(&args, file_config.as_ref());
    debug!(?settings, "settings resolved");

    let id = DatabusIdentifier::parse(&args.databus_uri)?;
    info!(%id, granularity = %id.granularity(), "resolving");

    let executor =
        SparqlHttpExecutor::new(settings.timeouts).context("Failed to build HTTP client")?;
    let mut resolver = MetadataResolver::new(Box::new(executor));
    if let Some(endpoint) = &settings.endpoint {
        resolver = resolver.with_endpoint(endpoint.as_str());
    }
    let files = resolver.resolve(&id, &settings.selector).await?;
    let destination = layout::destination_dir(&settings.output_dir, &id, files.version_literal());
    info!(
        version = files.version_literal(),
        files = files.len(),
        destination = %destination.display(),
        "resolved"
    );

    let run_progress = Arc::new(RunProgress::new());
    let interrupted = Arc::new(AtomicBool::new(false));
    let orchestrator = build_orchestrator(&settings)?
        .with_interrupt_flag(Arc::clone(&interrupted))
        .with_progress(Arc::clone(&run_progress));

    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let use_spinner = !settings.dry_run
        && terminal::should_use_spinner(
            io::stderr().is_terminal(),
            args.quiet,
            terminal::is_dumb_terminal(),
        );
    let (progress_handle, progress_stop) =
        progress::spawn_progress_ui(use_spinner, Arc::clone(&run_progress), files.len());

    let options = RunOptions {
        fail_fast: settings.fail_fast,
        dry_run: settings.dry_run,
    };
    let run_result = orchestrator
        .run(files.file_urls(), &destination, options)
        .await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = run_result.with_context(|| {
        format!(
            "Failed to prepare destination directory '{}'",
            destination.display()
        )
    })?;

    output::print_run_summary(&files, &destination, &summary, settings.dry_run);

    if summary.was_interrupted() {
        warn!(
            completed = summary.success_count(),
            skipped = summary.skipped(),
            "Interrupted"
        );
    }

    Ok(exit_handler::exit_outcome_for(&summary))
}

fn build_orchestrator(settings: &Settings) -> Result<DownloadOrchestrator> {
    let client = HttpClient::new(settings.timeouts).context("Failed to build HTTP client")?;
    let prober = RedirectProber::new(settings.timeouts).context("Failed to build HTTP client")?;
    let orchestrator = DownloadOrchestrator::new(client, prober, settings.vault.clone());

    if settings.dry_run {
        return Ok(orchestrator);
    }
    Ok(orchestrator.with_token_client(build_token_client(settings)?))
}

/// `None` when no refresh token source is configured; Vault files then fail individually.
fn build_token_client(settings: &Settings) -> Result<Option<TokenExchangeClient>> {
    let Some(source) = &settings.token_source else {
        debug!("no refresh token configured, Vault downloads disabled");
        return Ok(None);
    };
    let refresh_token = source
        .load()
        .with_context(|| format!("Failed to load refresh token from {}", source.describe()))?;
    debug!(source = %source.describe(), auth_url = %settings.auth_url, "Vault access configured");

    let client = TokenExchangeClient::new(
        settings.auth_url.as_str(),
        settings.client_id.as_str(),
        refresh_token,
        settings.timeouts,
    )?;
    Ok(Some(client))
}
