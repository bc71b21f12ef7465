//! Shared User-Agent string for metadata, token, and download traffic.

/// Project URL for User-Agent identification (RFC 9308 good citizenship).
const PROJECT_UA_URL: &str = "https://github.com/dbpedia/databus-client";

/// Default User-Agent for every request the tool makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("databus-dl/{version} (+{PROJECT_UA_URL})")
}
