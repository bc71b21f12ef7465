//! Direct vs. Vault-managed storage.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use super::probe::RedirectProbeResult;
use crate::http_client::url_authority;

/// Authorities that host Vault-protected files unless configured otherwise.
pub const DEFAULT_VAULT_AUTHORITIES: &[&str] = &["data.dbpedia.io", "data.dev-dbpedia.link"];

/// How a file must be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Plain GET of the original URL, redirects followed natively.
    Direct(Url),
    /// Token-authenticated GET of the redirect target.
    VaultManaged(Url),
}

impl StorageTarget {
    /// URL the fetch will be issued against.
    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            Self::Direct(url) | Self::VaultManaged(url) => url,
        }
    }

    /// Whether this target needs a Bearer token.
    #[must_use]
    pub fn is_vault_managed(&self) -> bool {
        matches!(self, Self::VaultManaged(_))
    }
}

/// A set of Vault authorities compared by exact `host[:port]` equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultAuthorities {
    authorities: HashSet<String>,
}

impl VaultAuthorities {
    /// Builds the set, normalizing case and dropping blank entries.
    pub fn new<I, S>(authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            authorities: authorities
                .into_iter()
                .map(|authority| authority.as_ref().trim().to_ascii_lowercase())
                .filter(|authority| !authority.is_empty())
                .collect(),
        }
    }

    /// Whether `authority` is Vault-managed.
    #[must_use]
    pub fn contains(&self, authority: &str) -> bool {
        self.authorities.contains(&authority.to_ascii_lowercase())
    }

    /// Number of configured authorities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    /// Whether no authorities are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }
}

/// Classifies `url` given the result of probing it.
///
/// A file is Vault-managed exactly when the probe found a redirect and the
/// redirect target's authority is in `vault`.
#[must_use]
pub fn classify(url: &Url, probe: &RedirectProbeResult, vault: &VaultAuthorities) -> StorageTarget {
    match &probe.location {
        Some(location)
            if url_authority(location).is_some_and(|authority| vault.contains(&authority)) =>
        {
            debug!(url = %url, location = %location, "vault-managed storage");
            StorageTarget::VaultManaged(location.clone())
        }
        _ => StorageTarget::Direct(url.clone()),
    }
}
