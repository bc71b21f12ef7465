//! One-hop redirect probing.
//!
//! Sends a HEAD request without following redirects and reports the first
//! `Location` header, if any. The prober never fails: a transport error, a
//! missing header, or an unparseable header all mean "no redirect".

use reqwest::Client;
use reqwest::header::LOCATION;
use tracing::{debug, instrument};
use url::Url;

use crate::http_client::{HttpTimeouts, Redirects, build_client};

/// Result of probing one file URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectProbeResult {
    /// Absolute redirect target, relative values resolved against the probed URL.
    pub location: Option<Url>,
}

/// Issues HEAD requests with redirects disabled.
#[derive(Debug, Clone)]
pub struct RedirectProber {
    client: Client,
}

impl RedirectProber {
    /// Creates a prober with the shared timeout policy.
    ///
    /// # Errors
    ///
    /// Returns the builder error if TLS or proxy setup fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(Redirects::Manual, timeouts)?,
        })
    }

    /// Probes `url` for an immediate redirect.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn probe(&self, url: &Url) -> RedirectProbeResult {
        let response = match self.client.head(url.as_str()).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(error = %error, "redirect probe failed, treating as direct");
                return RedirectProbeResult::default();
            }
        };

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| url.join(value.trim()).ok());

        debug!(
            status = response.status().as_u16(),
            location = location.as_ref().map(Url::as_str),
            "redirect probe complete"
        );
        RedirectProbeResult { location }
    }
}
