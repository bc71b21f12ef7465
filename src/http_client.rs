//! Shared HTTP client construction policy.
//!
//! Every client the tool builds shares the same User-Agent, connect timeout,
//! and optional per-request timeout. Only the redirect policy differs: the
//! redirect prober must see the first `Location` header, everything else
//! follows redirects natively.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, redirect};
use url::Url;

use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Timeout settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds; `None` keeps the transport default (no limit).
    pub request_secs: Option<u64>,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            request_secs: None,
        }
    }
}

impl HttpTimeouts {
    /// Default connect timeout with an explicit request timeout.
    #[must_use]
    pub fn with_request_secs(request_secs: Option<u64>) -> Self {
        Self {
            request_secs,
            ..Self::default()
        }
    }
}

/// Whether the client follows HTTP redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Redirects {
    Follow,
    Manual,
}

/// Builds a client with the shared policy.
pub(crate) fn build_client(
    redirects: Redirects,
    timeouts: HttpTimeouts,
) -> Result<Client, reqwest::Error> {
    base_builder(redirects, timeouts).build()
}

fn base_builder(redirects: Redirects, timeouts: HttpTimeouts) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .user_agent(user_agent::default_user_agent());
    if let Some(secs) = timeouts.request_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if redirects == Redirects::Manual {
        builder = builder.redirect(redirect::Policy::none());
    }
    builder
}

/// Host plus explicit port, e.g. `data.dbpedia.io` or `127.0.0.1:8080`.
///
/// Used both for matching Vault authorities and as the token audience.
#[must_use]
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
