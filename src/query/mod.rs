//! Metadata queries against a Databus SPARQL endpoint.
//!
//! This module owns everything between "what do we need to know" and "typed
//! rows back from the endpoint":
//!
//! - query builders ([`files_for_version`], [`files_for_latest`],
//!   [`latest_version_literal`], [`backlink_from_file`])
//! - literal escaping ([`escape_literal`])
//! - the [`QueryExecutor`] capability and its HTTP implementation
//! - decoding of tab-separated result sets ([`parse_tsv`])
//!
//! IRIs are embedded as `<...>` references without escaping. Only string
//! literals pass through [`escape_literal`].
//!
//! Version ordering is plain string comparison (`MAX(STR(?version))`). Literals
//! only sort correctly when they share a format such as ISO dates; `"9"` sorts
//! after `"10"`.

mod error;
mod executor;
mod tsv;

pub use error::QueryError;
pub use executor::{QueryExecutor, SparqlHttpExecutor};
pub use tsv::{Cell, TsvRow, parse_tsv};

const PREFIXES: &str = "\
PREFIX dcat:    <http://www.w3.org/ns/dcat#>
PREFIX dct:     <http://purl.org/dc/terms/>
PREFIX databus: <https://dataid.dbpedia.org/databus#>
";

/// Escapes a value for embedding inside a double-quoted SPARQL literal.
///
/// Backslashes are escaped before quotes so inserted escapes are not doubled.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Files of the distribution whose version literal equals `version`, ordered by file IRI.
#[must_use]
pub fn files_for_version(artifact_iri: &str, version: &str) -> String {
    let version = escape_literal(version);
    format!(
        "{PREFIXES}
SELECT DISTINCT ?file WHERE {{
    ?dataset databus:artifact <{artifact_iri}> ;
             dcat:distribution ?distribution ;
             dct:hasVersion ?version .
    ?distribution databus:file ?file .
    FILTER(STR(?version) = \"{version}\")
}}
ORDER BY STR(?file)
"
    )
}

/// Files of the lexicographically greatest version, ordered by file IRI.
#[must_use]
pub fn files_for_latest(artifact_iri: &str) -> String {
    format!(
        "{PREFIXES}
SELECT DISTINCT ?file WHERE {{
    {{
        SELECT (MAX(STR(?v)) AS ?latest) WHERE {{
            ?d databus:artifact <{artifact_iri}> ;
               dct:hasVersion ?v .
        }}
    }}
    ?dataset databus:artifact <{artifact_iri}> ;
             dcat:distribution ?distribution ;
             dct:hasVersion ?version .
    ?distribution databus:file ?file .
    FILTER(STR(?version) = ?latest)
}}
ORDER BY STR(?file)
"
    )
}

/// The single lexicographically greatest version literal of an artifact.
#[must_use]
pub fn latest_version_literal(artifact_iri: &str) -> String {
    format!(
        "{PREFIXES}
SELECT (MAX(STR(?version)) AS ?latestVersion) WHERE {{
    ?dataset databus:artifact <{artifact_iri}> ;
             dct:hasVersion ?version .
}}
"
    )
}

/// Owning artifact IRI and version literal of a concrete file. At most one row.
#[must_use]
pub fn backlink_from_file(file_iri: &str) -> String {
    format!(
        "{PREFIXES}
SELECT ?artifact ?version WHERE {{
    ?distribution databus:file <{file_iri}> .
    ?dataset dcat:distribution ?distribution ;
             databus:artifact ?artifact ;
             dct:hasVersion ?version .
}}
LIMIT 1
"
    )
}
