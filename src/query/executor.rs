//! The metadata query capability and its SPARQL-over-HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument};
use url::Url;
use url::form_urlencoded;

use super::QueryError;
use crate::http_client::{HttpTimeouts, Redirects, build_client};

/// Media type requested from the endpoint.
const TSV_MEDIA_TYPE: &str = "text/tab-separated-values";

/// Longest response body excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 512;

/// Executes a metadata query and returns the raw tab-separated result set.
///
/// # Object Safety
///
/// Uses `async_trait` so the resolver can hold a `Box<dyn QueryExecutor>`
/// supplied by the caller (tests plug in canned responses).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs `query` against `endpoint`.
    async fn execute(&self, endpoint: &str, query: &str) -> Result<String, QueryError>;
}

/// Posts SPARQL queries as `application/x-www-form-urlencoded` and asks for TSV results.
#[derive(Debug, Clone)]
pub struct SparqlHttpExecutor {
    client: Client,
}

impl SparqlHttpExecutor {
    /// Creates an executor with the shared HTTP policy.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if client construction fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(Redirects::Follow, timeouts)?,
        })
    }
}

#[async_trait]
impl QueryExecutor for SparqlHttpExecutor {
    #[instrument(skip(self, query), fields(endpoint = %endpoint))]
    async fn execute(&self, endpoint: &str, query: &str) -> Result<String, QueryError> {
        Url::parse(endpoint).map_err(|_| QueryError::invalid_endpoint(endpoint))?;

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("query", query)
            .finish();

        debug!(query_len = query.len(), "sending metadata query");
        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, TSV_MEDIA_TYPE)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| QueryError::transport(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QueryError::transport(endpoint, e))?;

        if !status.is_success() {
            let excerpt: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(QueryError::http_status(endpoint, status.as_u16(), excerpt.trim()));
        }

        debug!(bytes = text.len(), "metadata query answered");
        Ok(text)
    }
}
