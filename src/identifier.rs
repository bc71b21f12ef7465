//! Databus identifier parsing and granularity classification.
//!
//! A Databus IRI has the shape
//! `scheme://authority/user/group/artifact[/version[/file]]`. The number of
//! path segments decides what the identifier points at:
//!
//! | Segments | Granularity |
//! |----------|-------------|
//! | 3        | artifact    |
//! | 4        | version     |
//! | 5+       | file        |

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::http_client::url_authority;

/// Scheme assumed when the input omits one.
pub const DEFAULT_SCHEME: &str = "https";

/// `user/group/artifact` is the shortest meaningful path.
const MIN_PATH_SEGMENTS: usize = 3;

/// Errors that can occur while parsing a Databus identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// Input cannot be classified as an artifact, version, or file identifier.
    #[error(
        "malformed Databus identifier '{input}': {reason}\n  Suggestion: expected <host>/<user>/<group>/<artifact>[/<version>[/<file>]]"
    )]
    Malformed {
        /// The raw input as supplied.
        input: String,
        /// Why it could not be classified.
        reason: String,
    },
}

impl IdentifierError {
    /// Creates a `Malformed` error.
    #[must_use]
    pub fn malformed(input: &str, reason: &str) -> Self {
        Self::Malformed {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// What a Databus identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// `user/group/artifact`: every version of an artifact.
    Artifact,
    /// `user/group/artifact/version`: one published version.
    Version,
    /// Anything deeper: one concrete file.
    File,
}

impl Granularity {
    /// Classifies a path by its segment count. Returns `None` below three segments.
    #[must_use]
    pub fn from_segment_count(count: usize) -> Option<Self> {
        match count {
            0..MIN_PATH_SEGMENTS => None,
            3 => Some(Self::Artifact),
            4 => Some(Self::Version),
            _ => Some(Self::File),
        }
    }

    /// Stable lowercase label for logs and output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Version => "version",
            Self::File => "file",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, validated Databus identifier.
///
/// Constructed once from the raw input and never mutated. `user`, `group`,
/// and `artifact` always come from path segments 0-2. The version literal is
/// only taken from the path for version granularity; for file granularity the
/// whole IRI is the file locator and its version is looked up in metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabusIdentifier {
    iri: String,
    scheme: String,
    host: String,
    user: String,
    group: String,
    artifact: String,
    version: Option<String>,
    granularity: Granularity,
}

impl DatabusIdentifier {
    /// Parses a raw Databus IRI.
    ///
    /// The scheme defaults to [`DEFAULT_SCHEME`] when absent. Empty path
    /// segments (doubled or trailing slashes) are ignored when counting.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] when the input is not an IRI,
    /// has no authority, or its path has fewer than three segments.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::malformed(raw, "empty input"));
        }

        let iri = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{DEFAULT_SCHEME}://{trimmed}")
        };

        let url = Url::parse(&iri)
            .map_err(|e| IdentifierError::malformed(raw, &format!("not a valid IRI ({e})")))?;
        let host = url_authority(&url)
            .ok_or_else(|| IdentifierError::malformed(raw, "missing authority"))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let granularity = Granularity::from_segment_count(segments.len())
            .ok_or_else(|| IdentifierError::malformed(raw, "path too short"))?;

        let version = match granularity {
            Granularity::Version => Some(segments[3].to_string()),
            Granularity::Artifact | Granularity::File => None,
        };

        let iri = match granularity {
            // A file locator is used verbatim; it must match the metadata exactly.
            Granularity::File => iri,
            Granularity::Artifact | Granularity::Version => iri.trim_end_matches('/').to_string(),
        };

        Ok(Self {
            iri,
            scheme: url.scheme().to_string(),
            host,
            user: segments[0].to_string(),
            group: segments[1].to_string(),
            artifact: segments[2].to_string(),
            version,
            granularity,
        })
    }

    /// The identifier as an absolute IRI (scheme filled in).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.iri
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authority component, including a non-default port.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Version literal from the path (version granularity only).
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The concrete file locator (file granularity only).
    #[must_use]
    pub fn file_iri(&self) -> Option<&str> {
        (self.granularity == Granularity::File).then_some(self.iri.as_str())
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// `scheme://host/user/group/artifact`.
    #[must_use]
    pub fn artifact_iri(&self) -> String {
        format!(
            "{}://{}/{}/{}/{}",
            self.scheme, self.host, self.user, self.group, self.artifact
        )
    }

    /// Metadata endpoint derived from the identifier: `scheme://host/sparql`.
    #[must_use]
    pub fn default_endpoint(&self) -> String {
        format!("{}://{}/sparql", self.scheme, self.host)
    }
}

impl fmt::Display for DatabusIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iri)
    }
}
