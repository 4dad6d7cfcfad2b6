use std::fs;

use mockito::{Matcher, Server};
use tokio_util::sync::CancellationToken;
use toggle_core::{
    ApiClient, ClientConfig, Context, Error, FetchTogglesResult, HttpApiClient, HttpApiClientConfig,
};

const TOGGLES: &str = r#"{
  "version": 1,
  "features": [
    {"name": "remote-on", "enabled": true, "strategies": [{"name": "default"}]}
  ]
}"#;

const FEATURES_PATH: &str = "/api/client/features";

fn api_client(server: &Server) -> HttpApiClient {
    HttpApiClient::new(HttpApiClientConfig {
        base_url: format!("{}/api", server.url()),
        app_name: "checkout".to_owned(),
        instance_id: "it".to_owned(),
        custom_headers: Vec::new(),
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_persists_and_revalidates() {
    let mut server = Server::new_async().await;
    let full = server
        .mock("GET", FEATURES_PATH)
        .match_header("if-none-match", Matcher::Missing)
        .match_header("unleash-appname", "checkout")
        .match_header("unleash-instanceid", "it")
        .match_header("authorization", "secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("etag", "\"v1\"")
        .with_body(TOGGLES)
        .expect(1)
        .create_async()
        .await;
    let conditional = server
        .mock("GET", FEATURES_PATH)
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new("checkout", format!("{}/api", server.url()))
        .instance_id("it")
        .custom_header("Authorization", "secret")
        .backup_dir(dir.path());
    let toggle_file = config.toggle_file_path();
    let etag_file = config.etag_file_path();
    let client = config.to_client().unwrap();
    assert!(!client.is_enabled("remote-on", &Context::new()));

    let cancel = CancellationToken::new();
    client.fetch_task().execute(&cancel).await.unwrap();

    assert!(client.is_enabled("remote-on", &Context::new()));
    assert_eq!(client.fetch_task().etag(), "\"v1\"");
    assert_eq!(fs::read_to_string(&etag_file).unwrap(), "\"v1\"");
    assert!(fs::read_to_string(&toggle_file)
        .unwrap()
        .contains("remote-on"));

    client.fetch_task().execute(&cancel).await.unwrap();
    assert!(client.is_enabled("remote-on", &Context::new()));

    full.assert_async().await;
    conditional.assert_async().await;
}

#[tokio::test]
async fn maps_status_codes() {
    let cancel = CancellationToken::new();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEATURES_PATH)
        .with_status(401)
        .create_async()
        .await;
    let result = api_client(&server).fetch_toggles("", &cancel).await;
    assert!(matches!(result, Err(Error::Unauthorized)));
    mock.assert_async().await;

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEATURES_PATH)
        .with_status(500)
        .create_async()
        .await;
    let result = api_client(&server).fetch_toggles("", &cancel).await;
    assert!(matches!(result, Err(Error::UnexpectedStatus(status)) if status.as_u16() == 500));
    mock.assert_async().await;

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEATURES_PATH)
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .create_async()
        .await;
    let result = api_client(&server).fetch_toggles("\"v1\"", &cancel).await;
    assert!(matches!(result, Ok(FetchTogglesResult::Unchanged)));
    mock.assert_async().await;
}

#[tokio::test]
async fn corrupted_etag_falls_back_to_full_fetch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEATURES_PATH)
        .match_header("if-none-match", Matcher::Missing)
        .with_status(200)
        .with_header("etag", "\"v2\"")
        .with_body(TOGGLES)
        .create_async()
        .await;

    let result = api_client(&server)
        .fetch_toggles("v\u{1}1", &CancellationToken::new())
        .await;

    match result {
        Ok(FetchTogglesResult::Changed { etag, toggles }) => {
            assert_eq!(etag, "\"v2\"");
            assert!(toggles.get("remote-on").is_some());
        }
        other => panic!("expected changed toggles, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn keeps_non_ascii_etag() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", FEATURES_PATH)
        .with_status(200)
        .with_header("etag", "\"caf\u{e9}\"")
        .with_body(TOGGLES)
        .create_async()
        .await;

    let result = api_client(&server)
        .fetch_toggles("", &CancellationToken::new())
        .await;

    match result {
        Ok(FetchTogglesResult::Changed { etag, .. }) => assert_eq!(etag, "\"caf\u{e9}\""),
        other => panic!("expected changed toggles, got {other:?}"),
    }
    mock.assert_async().await;
}

#[test]
fn cold_start_uses_backup_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new("checkout", "http://127.0.0.1:9/api")
        .instance_id("it")
        .backup_dir(dir.path());
    fs::write(config.toggle_file_path(), TOGGLES).unwrap();
    fs::write(config.etag_file_path(), "\"v0\"\n").unwrap();

    let client = config.to_client().unwrap();

    assert_eq!(client.toggle_names(), ["remote-on"]);
    assert!(client.is_enabled("remote-on", &Context::new()));
    assert_eq!(client.fetch_task().etag(), "\"v0\"");
}

#[test]
fn corrupt_backup_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new("checkout", "http://127.0.0.1:9/api")
        .instance_id("it")
        .backup_dir(dir.path());
    fs::write(config.toggle_file_path(), "{ not json").unwrap();
    fs::write(config.etag_file_path(), "\"v0\"").unwrap();

    let client = config.to_client().unwrap();

    assert!(client.toggle_names().is_empty());
    assert_eq!(client.fetch_task().etag(), "");
}
