//! Integration tests for metadata resolution against a mock SPARQL endpoint.

mod support;

use databus_core::{
    DatabusIdentifier, HttpTimeouts, MetadataResolver, QueryError, ResolveError,
    SparqlHttpExecutor, VersionSelector,
};
use support::socket_guard::start_mock_server_or_skip;
use support::sparql::{BACKLINK, LATEST_FILES, LATEST_VERSION, QueryContains, mount_query, tsv};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn resolver() -> MetadataResolver {
    MetadataResolver::new(Box::new(
        SparqlHttpExecutor::new(HttpTimeouts::default()).unwrap(),
    ))
}

#[tokio::test]
async fn test_resolve_artifact_latest_uses_lexicographic_max() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let base = server.uri();
    mount_query(
        &server,
        LATEST_FILES,
        tsv(
            "?file",
            &[
                &format!("<{base}/u/g/a/2021-01-01/a.ttl>"),
                &format!("<{base}/u/g/a/2021-01-01/b.ttl>"),
            ],
        ),
    )
    .await;
    mount_query(
        &server,
        LATEST_VERSION,
        tsv("?latestVersion", &["\"2021-01-01\""]),
    )
    .await;

    let id = DatabusIdentifier::parse(&format!("{base}/u/g/a")).unwrap();
    let files = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap();

    assert_eq!(files.version_literal(), "2021-01-01");
    assert_eq!(
        files.file_urls(),
        [
            format!("{base}/u/g/a/2021-01-01/a.ttl"),
            format!("{base}/u/g/a/2021-01-01/b.ttl"),
        ]
    );
}

#[tokio::test]
async fn test_resolve_version_identifier_queries_that_version() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let base = server.uri();
    mount_query(
        &server,
        "\"2020.07.29\"",
        tsv(
            "?file",
            &[
                "<https://files.example.org/f1.ttl>",
                "<https://files.example.org/f2.ttl>",
                "<https://files.example.org/f1.ttl>",
            ],
        ),
    )
    .await;

    let id = DatabusIdentifier::parse(&format!("{base}/u/g/a/2020.07.29")).unwrap();
    let files = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap();

    assert_eq!(files.version_literal(), "2020.07.29");
    assert_eq!(
        files.file_urls(),
        [
            "https://files.example.org/f1.ttl",
            "https://files.example.org/f2.ttl"
        ]
    );
}

#[tokio::test]
async fn test_resolve_escapes_version_literal_in_query() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_query(
        &server,
        r#""v\"1\\2""#,
        tsv("?file", &["<https://files.example.org/odd.ttl>"]),
    )
    .await;

    let id = DatabusIdentifier::parse(&format!("{}/u/g/a", server.uri())).unwrap();
    let files = resolver()
        .resolve(&id, &VersionSelector::Literal(r#"v"1\2"#.to_string()))
        .await
        .unwrap();

    assert_eq!(files.version_literal(), r#"v"1\2"#);
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_resolve_empty_result_is_resolution_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_query(&server, "\"1999\"", tsv("?file", &[])).await;

    let id = DatabusIdentifier::parse(&format!("{}/u/g/a/1999", server.uri())).unwrap();
    let err = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap_err();

    match err {
        ResolveError::ResolutionFailed { reason, .. } => assert_eq!(reason, "no files resolved"),
        other => panic!("expected ResolutionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_endpoint_error_is_query_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let id = DatabusIdentifier::parse(&format!("{}/u/g/a", server.uri())).unwrap();
    let err = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            ResolveError::QueryExecution(QueryError::HttpStatus { status: 503, .. })
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_resolve_honors_endpoint_override() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/custom/sparql"))
        .and(QueryContains("\"1.0\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(tsv("?file", &["<https://files.example.org/x.ttl>"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let id = DatabusIdentifier::parse("https://databus.example.org/u/g/a/1.0").unwrap();
    let files = resolver()
        .with_endpoint(format!("{}/custom/sparql", server.uri()))
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap();

    assert_eq!(files.file_urls(), ["https://files.example.org/x.ttl"]);
}

#[tokio::test]
async fn test_resolve_file_identifier_uses_backlink_version() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let base = server.uri();
    mount_query(
        &server,
        BACKLINK,
        tsv(
            "?artifact\t?version",
            &[&format!("<{base}/u/g/a>\t\"2020.07.29\"")],
        ),
    )
    .await;

    let file_iri = format!("{base}/u/g/a/2020.07.29/x.nt.gz");
    let id = DatabusIdentifier::parse(&file_iri).unwrap();
    let files = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap();

    assert_eq!(files.version_literal(), "2020.07.29");
    assert_eq!(files.file_urls(), [file_iri]);
}

#[tokio::test]
async fn test_resolve_file_identifier_without_backlink_needs_explicit_version() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_query(&server, BACKLINK, tsv("?artifact\t?version", &[])).await;

    let file_iri = format!("{}/u/g/a/2020.07.29/x.nt.gz", server.uri());
    let id = DatabusIdentifier::parse(&file_iri).unwrap();

    let err = resolver()
        .resolve(&id, &VersionSelector::Latest)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ResolveError::ResolutionFailed { reason, .. } if reason == "could not determine version"),
        "got {err:?}"
    );

    let files = resolver()
        .resolve(&id, &VersionSelector::Literal("2020.07.29".to_string()))
        .await
        .unwrap();
    assert_eq!(files.version_literal(), "2020.07.29");
    assert_eq!(files.file_urls(), [file_iri]);
}
