//! File configuration and CLI merge.
//!
//! Precedence: CLI flags, then `$XDG_CONFIG_HOME/databus-dl/config.toml`
//! (or `$HOME/.config/databus-dl/config.toml`), then built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use databus_core::auth::{DEFAULT_AUTH_URL, DEFAULT_CLIENT_ID, RefreshTokenSource};
use databus_core::download::DEFAULT_VAULT_AUTHORITIES;
use databus_core::{HttpTimeouts, VaultAuthorities, VersionSelector};
use url::Url;

use crate::cli::Args;

const CONFIG_DIR_NAME: &str = "databus-dl";
const CONFIG_FILE_NAME: &str = "config.toml";
const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Values read from the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    pub endpoint: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub continue_on_error: Option<bool>,
    pub vault_authorities: Option<Vec<String>>,
    pub auth_url: Option<String>,
    pub client_id: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_http_url("endpoint", self.endpoint.as_deref())?;
        validate_http_url("auth_url", self.auth_url.as_deref())?;
        if let Some(timeout) = self.timeout_secs
            && !(1..=MAX_TIMEOUT_SECS).contains(&timeout)
        {
            bail!(
                "Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..={MAX_TIMEOUT_SECS}"
            );
        }
        if self.client_id.as_deref().is_some_and(str::is_empty) {
            bail!("Invalid config value for `client_id`: must not be empty");
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let url = Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

/// Everything a run needs, after merging CLI, file config, and defaults.
#[derive(Debug)]
pub(crate) struct Settings {
    pub selector: VersionSelector,
    pub endpoint: Option<String>,
    pub output_dir: PathBuf,
    pub fail_fast: bool,
    pub dry_run: bool,
    pub vault: VaultAuthorities,
    pub auth_url: String,
    pub client_id: String,
    pub token_source: Option<RefreshTokenSource>,
    pub timeouts: HttpTimeouts,
}

/// Merges CLI arguments over the file config.
pub(crate) fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Settings {
    let file = file.cloned().unwrap_or_default();

    let vault = if !args.vault_authorities.is_empty() {
        VaultAuthorities::new(&args.vault_authorities)
    } else if let Some(authorities) = &file.vault_authorities {
        VaultAuthorities::new(authorities)
    } else {
        VaultAuthorities::new(DEFAULT_VAULT_AUTHORITIES)
    };

    let token_source = RefreshTokenSource::discover(args.token_file.as_deref())
        .or_else(|| file.token_file.clone().map(RefreshTokenSource::File));

    Settings {
        selector: VersionSelector::parse(&args.dataset_version),
        endpoint: args.endpoint.clone().or(file.endpoint),
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        fail_fast: !(args.continue_on_error || file.continue_on_error.unwrap_or(false)),
        dry_run: args.dry_run,
        vault,
        auth_url: args
            .auth_url
            .clone()
            .or(file.auth_url)
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
        client_id: args
            .client_id
            .clone()
            .or(file.client_id)
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
        token_source,
        timeouts: HttpTimeouts::with_request_secs(args.timeout.or(file.timeout_secs)),
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/databus-dl/config.toml`
/// 2. `$HOME/.config/databus-dl/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from its default location, if one exists.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let string_value = || {
            parse_string_literal(value)
                .with_context(|| format!("Invalid `{key}` value on line {line_no}"))
        };

        match key {
            "endpoint" => cfg.endpoint = Some(string_value()?),
            "output_dir" => cfg.output_dir = Some(PathBuf::from(string_value()?)),
            "auth_url" => cfg.auth_url = Some(string_value()?),
            "client_id" => cfg.client_id = Some(string_value()?),
            "token_file" => cfg.token_file = Some(PathBuf::from(string_value()?)),
            "vault_authorities" => {
                cfg.vault_authorities = Some(
                    string_value()?
                        .split(',')
                        .map(str::trim)
                        .filter(|authority| !authority.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            "continue_on_error" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                cfg.continue_on_error = Some(parsed);
            }
            "timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                cfg.timeout_secs = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected boolean value `true` or `false`"),
    }
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    if token.starts_with('-') {
        bail!("Expected non-negative integer");
    }
    Ok(token.parse::<u64>()?)
}
