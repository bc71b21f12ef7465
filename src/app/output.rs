//! Human-readable run summary on stdout.
//!
//! Logs go to stderr; only this summary goes to stdout so it can be piped.

use std::fmt::Write as _;
use std::path::Path;

use databus_core::{ResolvedFileSet, RunSummary};

pub(crate) fn print_run_summary(
    files: &ResolvedFileSet,
    destination: &Path,
    summary: &RunSummary,
    dry_run: bool,
) {
    print!("{}", render_run_summary(files, destination, summary, dry_run));
}

pub(crate) fn render_run_summary(
    files: &ResolvedFileSet,
    destination: &Path,
    summary: &RunSummary,
    dry_run: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Resolved {} file(s) for version {}",
        files.len(),
        files.version_literal()
    );
    let _ = writeln!(out, "Destination: {}", destination.display());

    if dry_run {
        let _ = writeln!(out, "Dry run: nothing downloaded.");
        for url in files.file_urls() {
            let _ = writeln!(out, "  {url}");
        }
        return out;
    }

    let _ = writeln!(
        out,
        "Downloaded {}/{} file(s)",
        summary.success_count(),
        files.len()
    );

    let failed = summary.failed_urls();
    if !failed.is_empty() {
        let _ = writeln!(out, "Failed ({}):", failed.len());
        for url in failed {
            let _ = writeln!(out, "  {url}");
        }
    }

    if summary.skipped() > 0 {
        let reason = if summary.was_interrupted() {
            "interrupted"
        } else {
            "stopped after first failure; use --continue-on-error to keep going"
        };
        let _ = writeln!(out, "Skipped {} file(s): {reason}", summary.skipped());
    }
    out
}
