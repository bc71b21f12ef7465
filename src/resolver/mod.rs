//! Metadata resolution: identifier + version selector into a concrete file set.
//!
//! # Dispatch
//!
//! | Granularity | Selector     | Queries                                     |
//! |-------------|--------------|---------------------------------------------|
//! | artifact    | `Latest`     | files-for-latest, latest-version-literal    |
//! | artifact    | `Literal(v)` | files-for-version(v)                        |
//! | version     | (ignored)    | files-for-version(path version)             |
//! | file        | (fallback)   | backlink-from-file (best effort)            |
//!
//! # Example
//!
//! ```no_run
//! use databus_core::identifier::DatabusIdentifier;
//! use databus_core::query::SparqlHttpExecutor;
//! use databus_core::resolver::{MetadataResolver, VersionSelector};
//! use databus_core::HttpTimeouts;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let id = DatabusIdentifier::parse("https://databus.dbpedia.org/dbpedia/mappings/geo-coordinates-mappingbased")?;
//! let resolver = MetadataResolver::new(Box::new(SparqlHttpExecutor::new(HttpTimeouts::default())?));
//! let files = resolver.resolve(&id, &VersionSelector::Latest).await?;
//! println!("{} files in version {}", files.len(), files.version_literal());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ResolveError;

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::identifier::{DatabusIdentifier, Granularity};
use crate::query::{self, QueryExecutor, parse_tsv};

/// Which version of an artifact to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// The lexicographically greatest version literal.
    #[default]
    Latest,
    /// An exact version literal.
    Literal(String),
}

impl VersionSelector {
    /// `latest` (any case) selects [`VersionSelector::Latest`]; anything else is a literal.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("latest") {
            Self::Latest
        } else {
            Self::Literal(value.to_string())
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Literal(v) => f.write_str(v),
        }
    }
}

/// The outcome of resolution: one version literal and its files.
///
/// Invariants: the version literal is non-empty and there is at least one
/// file URL. URLs are deduplicated and keep query result order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFileSet {
    version_literal: String,
    file_urls: Vec<String>,
}

impl ResolvedFileSet {
    /// Builds a set, enforcing its invariants. `input` names the identifier in errors.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ResolutionFailed`] for an empty version literal or file list.
    pub fn new(
        input: &str,
        version_literal: String,
        file_urls: Vec<String>,
    ) -> Result<Self, ResolveError> {
        if version_literal.is_empty() {
            return Err(ResolveError::resolution_failed(input, "no version literal"));
        }
        if file_urls.is_empty() {
            return Err(ResolveError::resolution_failed(input, "no files resolved"));
        }
        Ok(Self {
            version_literal,
            file_urls,
        })
    }

    #[must_use]
    pub fn version_literal(&self) -> &str {
        &self.version_literal
    }

    #[must_use]
    pub fn file_urls(&self) -> &[String] {
        &self.file_urls
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.file_urls.len()
    }

    /// Always false for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_urls.is_empty()
    }
}

/// Turns identifiers into [`ResolvedFileSet`]s using a caller-supplied query executor.
pub struct MetadataResolver {
    executor: Box<dyn QueryExecutor>,
    endpoint: Option<String>,
}

impl fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl MetadataResolver {
    /// Creates a resolver that derives the endpoint from each identifier.
    #[must_use]
    pub fn new(executor: Box<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            endpoint: None,
        }
    }

    /// Overrides the derived `{scheme}://{host}/sparql` endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// The endpoint used for `id`.
    #[must_use]
    pub fn endpoint_for(&self, id: &DatabusIdentifier) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| id.default_endpoint())
    }

    /// Resolves `id` into a version literal and an ordered list of file URLs.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::QueryExecution`] when a required query fails
    /// - [`ResolveError::ResolutionFailed`] when no version literal or no
    ///   files could be established
    #[instrument(skip(self, id), fields(id = %id, granularity = %id.granularity()))]
    pub async fn resolve(
        &self,
        id: &DatabusIdentifier,
        selector: &VersionSelector,
    ) -> Result<ResolvedFileSet, ResolveError> {
        let endpoint = self.endpoint_for(id);
        let artifact_iri = id.artifact_iri();
        debug!(%endpoint, %artifact_iri, "resolving identifier");

        let (version, files) = match (id.granularity(), selector) {
            (Granularity::Artifact, VersionSelector::Latest) => {
                let files = self
                    .query_files(&endpoint, &query::files_for_latest(&artifact_iri))
                    .await?;
                let version = self.latest_version(&endpoint, &artifact_iri).await?;
                (version, files)
            }
            (Granularity::Artifact, VersionSelector::Literal(version)) => {
                let files = self
                    .query_files(&endpoint, &query::files_for_version(&artifact_iri, version))
                    .await?;
                (version.clone(), files)
            }
            (Granularity::Version, _) => {
                let version = id.version().unwrap_or_default().to_string();
                let files = self
                    .query_files(&endpoint, &query::files_for_version(&artifact_iri, &version))
                    .await?;
                (version, files)
            }
            (Granularity::File, _) => {
                let version = match self.backlink_version(&endpoint, id.as_str()).await {
                    Some(version) => version,
                    None => match selector {
                        VersionSelector::Literal(version) => {
                            debug!(%version, "using selector version for file identifier");
                            version.clone()
                        }
                        VersionSelector::Latest => {
                            return Err(ResolveError::resolution_failed(
                                id.as_str(),
                                "could not determine version",
                            ));
                        }
                    },
                };
                (version, vec![id.as_str().to_string()])
            }
        };

        let resolved = ResolvedFileSet::new(id.as_str(), version, files)?;
        info!(
            version = resolved.version_literal(),
            files = resolved.len(),
            "resolved identifier"
        );
        Ok(resolved)
    }

    async fn query_files(&self, endpoint: &str, query: &str) -> Result<Vec<String>, ResolveError> {
        let body = self.executor.execute(endpoint, query).await?;
        let mut seen = HashSet::new();
        let files = parse_tsv(&body)
            .iter()
            .filter_map(|row| row.get(0).non_empty().map(str::to_string))
            .filter(|url| seen.insert(url.clone()))
            .collect();
        Ok(files)
    }

    async fn latest_version(
        &self,
        endpoint: &str,
        artifact_iri: &str,
    ) -> Result<String, ResolveError> {
        let body = self
            .executor
            .execute(endpoint, &query::latest_version_literal(artifact_iri))
            .await?;
        Ok(parse_tsv(&body)
            .first()
            .and_then(|row| row.get(0).non_empty())
            .map(str::to_string)
            .unwrap_or_default())
    }

    /// Best-effort version lookup for a file IRI. Failures only log.
    async fn backlink_version(&self, endpoint: &str, file_iri: &str) -> Option<String> {
        let body = match self
            .executor
            .execute(endpoint, &query::backlink_from_file(file_iri))
            .await
        {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, "backlink lookup failed; continuing without it");
                return None;
            }
        };

        let rows = parse_tsv(&body);
        let Some(row) = rows.first() else {
            debug!("backlink lookup returned no rows");
            return None;
        };
        if let Some(artifact) = row.get(0).non_empty() {
            debug!(%artifact, "file belongs to artifact");
        }
        row.get(1).non_empty().map(str::to_string)
    }
}
