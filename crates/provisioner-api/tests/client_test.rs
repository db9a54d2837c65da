#![allow(clippy::unwrap_used)]
// Integration tests for `ProvisionerClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use provisioner_api::{Error, ProvisionerClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ProvisionerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ProvisionerClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

/// A base URL on a port nothing listens on.
fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
}

// ── Directory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_directory() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": "//127.0.0.1:8080/api/devices",
            "reboot_device": "//127.0.0.1:8080/api/devices/{mac}/reboot"
        })))
        .mount(&server)
        .await;

    let directory = client.fetch_directory("/api").await.unwrap();

    assert_eq!(directory.len(), 2);
    assert_eq!(
        directory.get("reboot_device").map(String::as_str),
        Some("//127.0.0.1:8080/api/devices/{mac}/reboot")
    );
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "mac_address": "04:18:d6:00:00:02",
                "has_config": true,
                "can_upgrade": false,
                "hostname": "ap-lobby",
                "status": "idle",
                "last_seen_at": 1_700_000_000
            },
            { "mac_address": "04:18:d6:00:00:01" }
        ])))
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices").unwrap();
    let devices = client.list_devices(url).await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].hostname.as_deref(), Some("ap-lobby"));
    assert!(devices[0].has_config);
    assert_eq!(devices[0].last_seen_at, Some(1_700_000_000));
    assert!(!devices[1].can_upgrade);
}

#[tokio::test]
async fn test_get_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices/04:18:d6:00:00:01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mac_address": "04:18:d6:00:00:01",
            "model": "NanoStation M5",
            "firmware": "XW.v6.1.7"
        })))
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices/04:18:d6:00:00:01").unwrap();
    let device = client.get_device(url).await.unwrap();

    assert_eq!(device.model.as_deref(), Some("NanoStation M5"));
    assert_eq!(device.firmware.as_deref(), Some("XW.v6.1.7"));
}

#[tokio::test]
async fn test_list_devices_bad_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices").unwrap();
    let result = client.list_devices(url).await;

    match result {
        Err(err @ Error::Deserialization { .. }) => {
            assert_eq!(err.status_text(), "parsererror");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Actions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_post_action_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/aa/reboot"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "success",
            "message": "Rebooting device aa."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices/aa/reboot").unwrap();
    let resp = client.post_action(url).await.unwrap();

    assert_eq!(resp.kind, "success");
    assert_eq!(resp.message, "Rebooting device aa.");
}

#[tokio::test]
async fn test_post_action_error_with_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/aa/upgrade"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "type": "danger",
            "message": "cannot safely upgrade device aa"
        })))
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices/aa/upgrade").unwrap();
    let err = client.post_action(url).await.unwrap_err();

    assert_eq!(err.status_text(), "422");
    let body = err.response_body().unwrap();
    assert_eq!(body.kind, "danger");
    assert_eq!(body.message, "cannot safely upgrade device aa");
}

#[tokio::test]
async fn test_post_action_error_without_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/aa/provision"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let url = client.endpoint("/api/devices/aa/provision").unwrap();
    let err = client.post_action(url).await.unwrap_err();

    assert!(
        matches!(err, Error::Http { status: 500, body: None, .. }),
        "expected Http 500 without body, got: {err:?}"
    );
    assert_eq!(err.error_text(), "Internal Server Error");
}

// ── Connection failures ─────────────────────────────────────────────

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let client = ProvisionerClient::with_client(reqwest::Client::new(), closed_port_url());

    let url = client.endpoint("/api/devices").unwrap();
    let err = client.list_devices(url).await.unwrap_err();

    assert!(err.is_unreachable(), "expected Unreachable, got: {err:?}");
}
