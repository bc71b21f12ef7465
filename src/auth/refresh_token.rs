//! Where the long-lived refresh token comes from.
//!
//! The token is read once per run and treated as read-only input. Files may
//! contain the bare token or a JSON object with a `refresh_token` field.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::AuthError;

/// Environment variable holding the refresh token.
pub const REFRESH_TOKEN_ENV: &str = "REFRESH_TOKEN";

/// A configured refresh-token source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTokenSource {
    /// Read from the named environment variable.
    Env(String),
    /// Read from a file.
    File(PathBuf),
}

impl RefreshTokenSource {
    /// Picks a source: an explicit token file wins, then [`REFRESH_TOKEN_ENV`].
    #[must_use]
    pub fn discover(token_file: Option<&Path>) -> Option<Self> {
        if let Some(path) = token_file {
            return Some(Self::File(path.to_path_buf()));
        }
        std::env::var(REFRESH_TOKEN_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|_| Self::Env(REFRESH_TOKEN_ENV.to_string()))
    }

    /// Reads the token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenFile`] when the file cannot be read
    /// - [`AuthError::NotConfigured`] when the source is empty
    pub fn load(&self) -> Result<String, AuthError> {
        let raw = match self {
            Self::Env(name) => std::env::var(name).unwrap_or_default(),
            Self::File(path) => {
                debug!(path = %path.display(), "reading refresh token file");
                std::fs::read_to_string(path).map_err(|source| AuthError::TokenFile {
                    path: path.clone(),
                    source,
                })?
            }
        };

        let token = parse_token_text(&raw);
        if token.is_empty() {
            return Err(AuthError::not_configured(format!(
                "refresh token source {} is empty",
                self.describe()
            )));
        }
        Ok(token)
    }

    /// Human-readable name of the source, never the token itself.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Env(name) => format!("${name}"),
            Self::File(path) => path.display().to_string(),
        }
    }
}

fn parse_token_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('{')
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        return value
            .get("refresh_token")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
    }
    trimmed.to_string()
}
