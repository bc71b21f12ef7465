//! Two-step OAuth exchange for Vault-managed downloads.
//!
//! 1. `grant_type=refresh_token` turns the long-lived refresh token into an
//!    access token.
//! 2. `grant_type=urn:ietf:params:oauth:grant-type:token-exchange` turns that
//!    access token into one scoped to the storage host (the audience).
//!
//! Exchanged tokens are cached per audience until shortly before the
//! `expires_in` the token endpoint reported. A token without `expires_in`
//! stays cached until [`TokenExchangeClient::invalidate`] drops it.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{AuthError, TokenStep};
use crate::http_client::{HttpTimeouts, Redirects, build_client};

/// Default OpenID Connect token endpoint.
pub const DEFAULT_AUTH_URL: &str =
    "https://auth.dbpedia.org/realms/dbpedia/protocol/openid-connect/token";

/// Default OAuth client id.
pub const DEFAULT_CLIENT_ID: &str = "vault-token-exchange";

const REFRESH_GRANT: &str = "refresh_token";
const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// A cached token is dropped this long before its reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Tokens produced by one full exchange.
#[derive(Clone)]
pub struct TokenSet {
    /// Access token from the refresh grant.
    pub access_token: String,
    /// Audience-scoped token used as the Bearer credential.
    pub exchanged_token: String,
    /// Lifetime of the exchanged token in seconds, when reported.
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("exchanged_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn detail(&self) -> String {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => format!("{error}: {description}"),
            (Some(error), None) => error.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => "no error detail".to_string(),
        }
    }
}

struct CachedToken {
    token: String,
    /// `None` when the endpoint did not report a lifetime.
    stale_at: Option<Instant>,
}

impl CachedToken {
    fn new(token: String, expires_in: Option<u64>, now: Instant) -> Self {
        let stale_at = expires_in
            .map(|secs| now + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN));
        Self { token, stale_at }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.stale_at.is_none_or(|stale_at| now < stale_at)
    }
}

/// One token endpoint answer.
struct IssuedToken {
    token: String,
    expires_in: Option<u64>,
}

/// Client for the token endpoint.
pub struct TokenExchangeClient {
    client: Client,
    auth_url: String,
    client_id: String,
    refresh_token: String,
    cache: DashMap<String, CachedToken>,
}

impl fmt::Debug for TokenExchangeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeClient")
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("refresh_token", &"<redacted>")
            .field("cached_audiences", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl TokenExchangeClient {
    /// Creates a client for the given endpoint and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn new(
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        refresh_token: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, AuthError> {
        let client = build_client(Redirects::Follow, timeouts)
            .map_err(|source| AuthError::transport(TokenStep::Refresh, source))?;
        Ok(Self {
            client,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            refresh_token: refresh_token.into(),
            cache: DashMap::new(),
        })
    }

    /// Returns a Bearer token for `audience`, exchanging when no fresh token is cached.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`Self::exchange`].
    pub async fn obtain_access_token(&self, audience: &str) -> Result<String, AuthError> {
        if let Some(token) = self.cached_token(audience) {
            debug!(audience, "using cached vault token");
            return Ok(token);
        }
        let tokens = self.exchange(audience).await?;
        self.cache.insert(
            audience.to_string(),
            CachedToken::new(
                tokens.exchanged_token.clone(),
                tokens.expires_in,
                Instant::now(),
            ),
        );
        Ok(tokens.exchanged_token)
    }

    /// Whether a fresh token for `audience` is cached.
    #[must_use]
    pub fn has_cached_token(&self, audience: &str) -> bool {
        self.cached_token(audience).is_some()
    }

    /// Drops the cached token for `audience`, e.g. after storage refused it.
    pub fn invalidate(&self, audience: &str) {
        if self.cache.remove(audience).is_some() {
            debug!(audience, "dropped cached vault token");
        }
    }

    fn cached_token(&self, audience: &str) -> Option<String> {
        let now = Instant::now();
        self.cache
            .get(audience)
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.token.clone())
    }

    /// Runs both steps of the exchange without consulting the cache.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Network`] / [`AuthError::Timeout`] on transport failure
    /// - [`AuthError::Rejected`] when the endpoint answers non-2xx
    /// - [`AuthError::MissingToken`] when a response has no `access_token`
    #[instrument(skip(self), fields(auth_url = %self.auth_url))]
    pub async fn exchange(&self, audience: &str) -> Result<TokenSet, AuthError> {
        let access = self
            .request_token(
                TokenStep::Refresh,
                &[
                    ("grant_type", REFRESH_GRANT),
                    ("client_id", &self.client_id),
                    ("refresh_token", &self.refresh_token),
                ],
            )
            .await?;

        let exchanged = self
            .request_token(
                TokenStep::Exchange,
                &[
                    ("grant_type", TOKEN_EXCHANGE_GRANT),
                    ("client_id", &self.client_id),
                    ("subject_token", &access.token),
                    ("audience", audience),
                ],
            )
            .await?;

        info!(audience, expires_in = exchanged.expires_in, "obtained vault access token");
        Ok(TokenSet {
            access_token: access.token,
            exchanged_token: exchanged.token,
            expires_in: exchanged.expires_in,
        })
    }

    async fn request_token(
        &self,
        step: TokenStep,
        params: &[(&str, &str)],
    ) -> Result<IssuedToken, AuthError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        debug!(%step, "requesting token");
        let response = self
            .client
            .post(&self.auth_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| AuthError::transport(step, source))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| AuthError::transport(step, source))?;
        let parsed: Option<TokenResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = parsed.as_ref().map_or_else(
                || text.chars().take(256).collect::<String>(),
                TokenResponse::detail,
            );
            return Err(AuthError::Rejected {
                step,
                status: status.as_u16(),
                detail,
            });
        }

        let response = parsed.ok_or(AuthError::MissingToken { step })?;
        let token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken { step })?;
        Ok(IssuedToken {
            token,
            expires_in: response.expires_in,
        })
    }
}
