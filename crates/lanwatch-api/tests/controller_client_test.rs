#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanwatch_api::{ControllerClient, ControllerPlatform, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(platform: ControllerPlatform) -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ControllerClient::with_client(
        reqwest::Client::new(),
        base_url,
        "default".into(),
        platform,
    );
    (server, client)
}

async fn setup() -> (MockServer, ControllerClient) {
    setup_with(ControllerPlatform::Classic).await
}

fn site_path(suffix: &str) -> String {
    format!("/api/s/default/{suffix}")
}

fn secret(value: &str) -> secrecy::SecretString {
    value.to_string().into()
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" } })))
        .expect(1)
        .mount(&server)
        .await;

    client.login("admin", &secret("hunter2")).await.unwrap();
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.Invalid" },
            "data": []
        })))
        .mount(&server)
        .await;

    let result = client.login("admin", &secret("wrong")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_server_error_is_not_a_credential_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.login("admin", &secret("hunter2")).await;

    assert!(
        matches!(result, Err(Error::Controller { .. })),
        "expected Controller error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_throttled() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&server)
        .await;

    let result = client.login("admin", &secret("hunter2")).await;

    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 3 })),
        "expected RateLimited error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unifi_os_csrf_token_is_forwarded() {
    let (server, client) = setup_with(ControllerPlatform::UnifiOs).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-CSRF-Token", "tok-1"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/proxy/network/api/s/default/cmd/stamgr"))
        .and(header("X-CSRF-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [{ "mac": "aa:bb:cc:dd:ee:01", "blocked": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.login("admin", &secret("hunter2")).await.unwrap();
    let confirmation = client.block_client("aa:bb:cc:dd:ee:01").await.unwrap();
    assert_eq!(confirmation.len(), 1);
}

// ── Station tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_clients() {
    let (server, client) = setup().await;

    let envelope = json!({
        "meta": { "rc": "ok" },
        "data": [
            {
                "_id": "sta001",
                "mac": "aa:bb:cc:dd:ee:01",
                "hostname": "pixel-8",
                "ip": "192.168.1.20",
                "oui": "Google",
                "is_wired": false,
                "essid": "home",
                "ap_mac": "f0:9f:c2:00:00:01",
                "signal": -52,
                "tx_bytes": 1024,
                "rx_bytes": 4096,
                "first_seen": 1_718_000_000,
                "last_seen": 1_718_450_000
            },
            {
                "_id": "sta002",
                "mac": "aa:bb:cc:dd:ee:02",
                "is_wired": true
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path(site_path("stat/sta")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let clients = client.list_clients().await.unwrap();

    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].mac, "aa:bb:cc:dd:ee:01");
    assert_eq!(clients[0].hostname.as_deref(), Some("pixel-8"));
    assert_eq!(clients[0].signal, Some(-52));
    assert_eq!(clients[0].last_seen, Some(1_718_450_000));
    assert_eq!(clients[1].is_wired, Some(true));
}

#[tokio::test]
async fn test_list_clients_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("stat/sta")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": [] })),
        )
        .mount(&server)
        .await;

    assert!(client.list_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_blocked_clients_filters_unblocked_users() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(site_path("rest/user")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [
                { "_id": "u1", "mac": "aa:bb:cc:dd:ee:01", "blocked": true },
                { "_id": "u2", "mac": "aa:bb:cc:dd:ee:02", "blocked": false },
                { "_id": "u3", "mac": "aa:bb:cc:dd:ee:03" }
            ]
        })))
        .mount(&server)
        .await;

    let blocked = client.list_blocked_clients().await.unwrap();
    assert_eq!(blocked, vec!["aa:bb:cc:dd:ee:01".to_string()]);
}

#[tokio::test]
async fn test_block_sends_stamgr_command() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("cmd/stamgr")))
        .and(body_json(json!({ "cmd": "unblock-sta", "mac": "aa:bb:cc:dd:ee:01" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [{ "mac": "aa:bb:cc:dd:ee:01", "blocked": false }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmation = client.unblock_client("aa:bb:cc:dd:ee:01").await.unwrap();
    assert_eq!(confirmation[0]["blocked"], json!(false));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_clients().await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(
                message.contains("session expired"),
                "expected auth error message, got: {message}"
            );
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_permission_denied() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(site_path("cmd/stamgr")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.block_client("aa:bb:cc:dd:ee:01").await;
    assert!(
        matches!(result, Err(Error::PermissionDenied { .. })),
        "expected PermissionDenied, got: {result:?}"
    );
}

#[tokio::test]
async fn test_envelope_error() {
    let (server, client) = setup().await;

    let envelope = json!({
        "meta": { "rc": "error", "msg": "api.err.UnknownStation" },
        "data": []
    });

    Mock::given(method("POST"))
        .and(path(site_path("cmd/stamgr")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let result = client.block_client("aa:bb:cc:dd:ee:09").await;

    match result {
        Err(Error::Controller { ref message }) => {
            assert!(
                message.contains("UnknownStation"),
                "expected 'UnknownStation' in message, got: {message}"
            );
        }
        other => panic!("expected Controller error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unifi_os_error_body_with_http_200() {
    let (server, client) = setup_with(ControllerPlatform::UnifiOs).await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 401, "message": "Unauthorized" }
        })))
        .mount(&server)
        .await;

    let result = client.list_clients().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}
