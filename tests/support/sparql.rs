//! Mock SPARQL endpoint helpers.

use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches a form-encoded POST whose `query` field contains a marker.
pub struct QueryContains(pub &'static str);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body)
            .any(|(key, value)| key == "query" && value.contains(self.0))
    }
}

/// Matches a form-encoded body containing `key=value` exactly.
pub struct FormField(pub &'static str, pub String);

impl Match for FormField {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body)
            .any(|(key, value)| key == self.0 && value == self.1)
    }
}

/// Marker present only in the files-of-latest-version query.
pub const LATEST_FILES: &str = "AS ?latest)";
/// Marker present only in the latest-version-literal query.
pub const LATEST_VERSION: &str = "AS ?latestVersion)";
/// Marker present only in the file backlink query.
pub const BACKLINK: &str = "SELECT ?artifact ?version";

/// Builds a TSV body: header line, then one line per row.
pub fn tsv(header_line: &str, rows: &[&str]) -> String {
    let mut body = format!("{header_line}\r\n");
    for row in rows {
        body.push_str(row);
        body.push_str("\r\n");
    }
    body
}

/// Mounts a SPARQL response at `/sparql` for queries containing `marker`.
pub async fn mount_query(server: &MockServer, marker: &'static str, body: String) {
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("accept", "text/tab-separated-values"))
        .and(QueryContains(marker))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/tab-separated-values")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}
