//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

const EXIT_CODES_HELP: &str = "Exit codes:
  0 = all files downloaded (or dry run)
  1 = partial success
  2 = complete failure, early stop, or fatal error";

/// Download DBpedia Databus artifacts, versions, or single files.
///
/// Resolves the given Databus IRI against the metadata endpoint and fetches
/// every file of the selected version into
/// `<output-dir>/<user>/<group>/<artifact>/<version>/`. Files kept in Vault
/// storage are fetched with a token obtained from the refresh token in
/// `$REFRESH_TOKEN` or `--token-file`.
#[derive(Parser, Debug)]
#[command(name = "databus-dl")]
#[command(author, version, about)]
#[command(after_help = EXIT_CODES_HELP)]
pub struct Args {
    /// Databus artifact, version, or file IRI (scheme defaults to https)
    #[arg(value_name = "DATABUS_URI")]
    pub databus_uri: String,

    /// Version to download: `latest` or an exact version literal
    #[arg(long, value_name = "VERSION", default_value = "latest")]
    pub dataset_version: String,

    /// SPARQL endpoint (default: <scheme>://<host>/sparql of the input)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Resolve and list files without downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Root directory for downloads (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep going after a failed file and report all failures at the end
    #[arg(long)]
    pub continue_on_error: bool,

    /// Host[:port] whose redirects require a Vault token (repeatable)
    #[arg(long = "vault-authority", value_name = "HOST")]
    pub vault_authorities: Vec<String>,

    /// OpenID Connect token endpoint for Vault access
    #[arg(long, value_name = "URL")]
    pub auth_url: Option<String>,

    /// OAuth client id for the token exchange
    #[arg(long, value_name = "ID")]
    pub client_id: Option<String>,

    /// File holding the refresh token (bare or JSON `refresh_token`)
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Per-request timeout in seconds (default: no limit)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}
