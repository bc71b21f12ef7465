//! Integration tests for the download orchestrator: probing, Vault token
//! exchange, failure policy, and dry runs against mock servers.

mod support;

use std::path::Path;

use databus_core::{
    DownloadOrchestrator, HttpClient, HttpTimeouts, OutcomeStatus, RedirectProber, RunOptions,
    TokenExchangeClient, VaultAuthorities,
};
use support::socket_guard::start_mock_server_or_skip;
use support::sparql::FormField;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn authority(server: &MockServer) -> String {
    server.address().to_string()
}

fn orchestrator(vault: VaultAuthorities) -> DownloadOrchestrator {
    let timeouts = HttpTimeouts::default();
    DownloadOrchestrator::new(
        HttpClient::new(timeouts).unwrap(),
        RedirectProber::new(timeouts).unwrap(),
        vault,
    )
}

fn token_client(auth: &MockServer) -> TokenExchangeClient {
    TokenExchangeClient::new(
        format!("{}/token", auth.uri()),
        "vault-token-exchange",
        "refresh-abc".to_string(),
        HttpTimeouts::default(),
    )
    .unwrap()
}

async fn mount_token_endpoint(auth: &MockServer, audience: String, expected_rounds: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(FormField("grant_type", "refresh_token".to_string()))
        .and(FormField("refresh_token", "refresh-abc".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "token_type": "Bearer"
        })))
        .expect(expected_rounds)
        .mount(auth)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(FormField(
            "grant_type",
            "urn:ietf:params:oauth:grant-type:token-exchange".to_string(),
        ))
        .and(FormField("subject_token", "access-1".to_string()))
        .and(FormField("audience", audience))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "vault-1"
        })))
        .expect(expected_rounds)
        .mount(auth)
        .await;
}

async fn mount_vault_redirect(files: &MockServer, vault: &MockServer, name: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{name}")))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/store/{name}", vault.uri()).as_str()),
        )
        .mount(files)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/store/{name}")))
        .and(header("authorization", "Bearer vault-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("vault {name}")))
        .mount(vault)
        .await;
}

async fn mount_direct(files: &MockServer, name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(status).set_body_string(format!("direct {name}")))
        .mount(files)
        .await;
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_run_mixes_vault_and_direct_files() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    mount_token_endpoint(&vault, authority(&vault), 1).await;
    mount_vault_redirect(&files, &vault, "f1.ttl").await;
    mount_direct(&files, "f2.ttl", 200).await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("u/g/a/2020.07.29");
    let urls = vec![
        format!("{}/f1.ttl", files.uri()),
        format!("{}/f2.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, &dest, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2, "outcomes: {:?}", summary.outcomes());
    assert_eq!(summary.failure_count(), 0);
    assert_eq!(read(&dest, "f1.ttl"), "vault f1.ttl");
    assert_eq!(read(&dest, "f2.ttl"), "direct f2.ttl");
}

#[tokio::test]
async fn test_vault_token_is_exchanged_once_per_audience() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    mount_token_endpoint(&vault, authority(&vault), 1).await;
    mount_vault_redirect(&files, &vault, "a.ttl").await;
    mount_vault_redirect(&files, &vault, "b.ttl").await;

    let temp = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/a.ttl", files.uri()),
        format!("{}/b.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2, "outcomes: {:?}", summary.outcomes());
    vault.verify().await;
}

#[tokio::test]
async fn test_redirect_to_unlisted_host_is_followed_without_token() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(mirror) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .and(path("/f.ttl"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/mirror/f.ttl", mirror.uri()).as_str()),
        )
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .and(path("/f.ttl"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/mirror/f.ttl", mirror.uri()).as_str()),
        )
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .and(path("/mirror/f.ttl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("mirrored"))
        .mount(&mirror)
        .await;

    let temp = TempDir::new().unwrap();
    let urls = vec![format!("{}/f.ttl", files.uri())];

    let summary = orchestrator(VaultAuthorities::new(["data.dbpedia.io"]))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 1, "outcomes: {:?}", summary.outcomes());
    assert_eq!(read(temp.path(), "f.ttl"), "mirrored");
}

#[tokio::test]
async fn test_continue_on_error_attempts_every_file() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    mount_direct(&files, "1.ttl", 200).await;
    mount_direct(&files, "2.ttl", 404).await;
    mount_direct(&files, "3.ttl", 200).await;

    let temp = TempDir::new().unwrap();
    let urls: Vec<String> = ["1.ttl", "2.ttl", "3.ttl"]
        .iter()
        .map(|name| format!("{}/{name}", files.uri()))
        .collect();

    let summary = orchestrator(VaultAuthorities::default())
        .run(
            &urls,
            temp.path(),
            RunOptions {
                fail_fast: false,
                dry_run: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2);
    assert_eq!(summary.failure_count(), 1);
    assert_eq!(summary.failed_urls(), [urls[1].as_str()]);
    assert_eq!(summary.skipped(), 0);
    assert!(!summary.was_aborted());
    assert!(temp.path().join("3.ttl").exists());
    assert!(!temp.path().join("2.ttl").exists());
}

#[tokio::test]
async fn test_fail_fast_stops_after_first_failure() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    mount_direct(&files, "1.ttl", 200).await;
    mount_direct(&files, "2.ttl", 500).await;
    Mock::given(method("GET"))
        .and(path("/3.ttl"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&files)
        .await;

    let temp = TempDir::new().unwrap();
    let urls: Vec<String> = ["1.ttl", "2.ttl", "3.ttl"]
        .iter()
        .map(|name| format!("{}/{name}", files.uri()))
        .collect();

    let summary = orchestrator(VaultAuthorities::default())
        .run(
            &urls,
            temp.path(),
            RunOptions {
                fail_fast: true,
                dry_run: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 1);
    assert_eq!(summary.failure_count(), 1);
    assert_eq!(summary.skipped(), 1);
    assert!(summary.was_aborted());
    assert!(!temp.path().join("3.ttl").exists());
    files.verify().await;
}

#[tokio::test]
async fn test_dry_run_touches_neither_network_nor_disk() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&files)
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("u/g/a/1.0");
    let urls = vec![
        format!("{}/a.ttl", files.uri()),
        format!("{}/b.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::default())
        .run(
            &urls,
            &dest,
            RunOptions {
                fail_fast: true,
                dry_run: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.skipped(), 2);
    assert!(summary.outcomes().is_empty());
    assert!(!dest.exists());
    files.verify().await;
}

#[tokio::test]
async fn test_rejected_refresh_token_fails_vault_file_with_detail() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token is not active"
        })))
        .mount(&vault)
        .await;
    mount_vault_redirect(&files, &vault, "f1.ttl").await;
    mount_direct(&files, "f2.ttl", 200).await;

    let temp = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/f1.ttl", files.uri()),
        format!("{}/f2.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 1);
    let failed = &summary.outcomes()[0];
    assert_eq!(failed.status, OutcomeStatus::Failed);
    let detail = failed.error_detail.as_deref().unwrap();
    assert!(detail.contains("invalid_grant"), "detail: {detail}");
    assert!(detail.contains("Token is not active"), "detail: {detail}");
    assert!(!temp.path().join("f1.ttl").exists());
}

#[tokio::test]
async fn test_vault_rejecting_bearer_reports_access_denied() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    mount_token_endpoint(&vault, authority(&vault), 1).await;
    Mock::given(method("HEAD"))
        .and(path("/f.ttl"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/store/f.ttl", vault.uri()).as_str()),
        )
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .and(path("/store/f.ttl"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&vault)
        .await;

    let temp = TempDir::new().unwrap();
    let urls = vec![format!("{}/f.ttl", files.uri())];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.failure_count(), 1);
    let detail = summary.outcomes()[0].error_detail.clone().unwrap();
    assert!(detail.contains("403"), "detail: {detail}");
}

/// Refresh grant always succeeds; the first exchange issues `first`, later ones `second`.
async fn mount_rotating_tokens(
    auth: &MockServer,
    first: serde_json::Value,
    second: serde_json::Value,
) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(FormField("grant_type", "refresh_token".to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "access-1"})),
        )
        .mount(auth)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(FormField("subject_token", "access-1".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .up_to_n_times(1)
        .expect(1)
        .mount(auth)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(FormField("subject_token", "access-1".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(second))
        .expect(1)
        .mount(auth)
        .await;
}

/// Vault serves `/store/<name>` only to `accepted`; any other Bearer gets 401.
async fn mount_vault_file(files: &MockServer, vault: &MockServer, name: &str, accepted: &str) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{name}")))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/store/{name}", vault.uri()).as_str()),
        )
        .mount(files)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/store/{name}")))
        .and(header("authorization", format!("Bearer {accepted}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("vault {name}")))
        .mount(vault)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/store/{name}")))
        .respond_with(ResponseTemplate::new(401))
        .mount(vault)
        .await;
}

#[tokio::test]
async fn test_expired_vault_token_is_exchanged_again() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    mount_rotating_tokens(
        &vault,
        serde_json::json!({"access_token": "vault-1", "expires_in": 1}),
        serde_json::json!({"access_token": "vault-2", "expires_in": 300}),
    )
    .await;
    mount_vault_file(&files, &vault, "f1.ttl", "vault-1").await;
    mount_vault_file(&files, &vault, "f2.ttl", "vault-2").await;

    let temp = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/f1.ttl", files.uri()),
        format!("{}/f2.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2, "outcomes: {:?}", summary.outcomes());
    assert_eq!(read(temp.path(), "f2.ttl"), "vault f2.ttl");
    vault.verify().await;
}

#[tokio::test]
async fn test_refused_cached_token_is_replaced_once() {
    let Some(files) = start_mock_server_or_skip().await else {
        return;
    };
    let Some(vault) = start_mock_server_or_skip().await else {
        return;
    };
    mount_rotating_tokens(
        &vault,
        serde_json::json!({"access_token": "vault-1", "expires_in": 300}),
        serde_json::json!({"access_token": "vault-2", "expires_in": 300}),
    )
    .await;
    mount_vault_file(&files, &vault, "f1.ttl", "vault-1").await;
    mount_vault_file(&files, &vault, "f2.ttl", "vault-2").await;

    let temp = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/f1.ttl", files.uri()),
        format!("{}/f2.ttl", files.uri()),
    ];

    let summary = orchestrator(VaultAuthorities::new([authority(&vault)]))
        .with_token_client(Some(token_client(&vault)))
        .run(&urls, temp.path(), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success_count(), 2, "outcomes: {:?}", summary.outcomes());
    assert_eq!(read(temp.path(), "f2.ttl"), "vault f2.ttl");
    vault.verify().await;
}
