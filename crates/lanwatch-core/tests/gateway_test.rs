#![allow(clippy::unwrap_used)]
// Integration tests for `Gateway` and `BatchExecutor` using wiremock.
//
// These run on real time with tiny pacing intervals; wiremock and reqwest
// need a live clock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use lanwatch_api::{ControllerClient, ControllerPlatform};
use lanwatch_core::{
    BatchExecutor, ControllerConfig, CoreError, Gateway, MacAddress, RateLimitConfig, RateLimiter,
    RawClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_limiter() -> Arc<RateLimiter> {
    RateLimiter::shared(RateLimitConfig {
        min_interval: Duration::from_millis(5),
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
    })
}

fn config_for(server: &MockServer) -> ControllerConfig {
    ControllerConfig {
        host: Some(server.uri()),
        username: Some("admin".into()),
        password: Some("hunter2".to_string().into()),
        ..ControllerConfig::default()
    }
}

fn gateway_on(server: &MockServer, config: &ControllerConfig, limiter: Arc<RateLimiter>) -> Gateway {
    let client = ControllerClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        config.site.clone(),
        ControllerPlatform::Classic,
    );
    Gateway::with_client(client, config, limiter).unwrap()
}

async fn setup_with(config: impl FnOnce(&MockServer) -> ControllerConfig) -> (MockServer, Gateway) {
    let server = MockServer::start().await;
    let config = config(&server);
    let gateway = gateway_on(&server, &config, fast_limiter());
    (server, gateway)
}

async fn setup() -> (MockServer, Gateway) {
    setup_with(config_for).await
}

async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" } })))
        .expect(times)
        .mount(server)
        .await;
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

fn mac(n: u8) -> MacAddress {
    MacAddress::new(format!("aa:bb:cc:dd:ee:{n:02x}"))
}

// ── Configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unconfigured_gateway_fails_fast() {
    let gateway = Gateway::new(&ControllerConfig::default(), fast_limiter());
    assert!(!gateway.is_configured());
    assert!(gateway.session().is_none());

    let err = gateway.fetch_clients().await.unwrap_err();
    assert!(matches!(err, CoreError::Configuration { .. }), "got {err:?}");

    let err = gateway.fetch_blocked_clients().await.unwrap_err();
    assert!(matches!(err, CoreError::Configuration { .. }), "got {err:?}");

    let err = gateway.block(&mac(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Configuration { .. }), "got {err:?}");
}

// ── Session handling ────────────────────────────────────────────────

#[tokio::test]
async fn test_logs_in_once_for_consecutive_calls() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ok_envelope(json!([{ "mac": "aa:bb:cc:dd:ee:01" }])))
        .expect(2)
        .mount(&server)
        .await;

    assert_eq!(gateway.fetch_clients().await.unwrap().len(), 1);
    assert_eq!(gateway.fetch_clients().await.unwrap().len(), 1);
    assert!(gateway.session().unwrap().is_valid().await);
}

#[tokio::test]
async fn test_unauthorized_invalidates_session_and_next_call_logs_in() {
    let (server, gateway) = setup().await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ok_envelope(json!([])))
        .mount(&server)
        .await;

    let err = gateway.fetch_clients().await.unwrap_err();
    assert!(matches!(err, CoreError::Authentication { .. }), "got {err:?}");
    assert!(!gateway.session().unwrap().is_valid().await);

    assert!(gateway.fetch_clients().await.unwrap().is_empty());
    assert!(gateway.session().unwrap().is_valid().await);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_login() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ok_envelope(json!([])))
        .expect(5)
        .mount(&server)
        .await;

    let results: [Result<Vec<RawClient>, CoreError>; 5] = tokio::join!(
        gateway.fetch_clients(),
        gateway.fetch_clients(),
        gateway.fetch_clients(),
        gateway.fetch_clients(),
        gateway.fetch_clients(),
    )
    .into();
    for result in results {
        assert!(result.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_expired_session_logs_in_again() {
    let (server, gateway) = setup_with(|server| ControllerConfig {
        session_validity: Duration::from_millis(50),
        ..config_for(server)
    })
    .await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ok_envelope(json!([])))
        .mount(&server)
        .await;

    gateway.fetch_clients().await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    gateway.fetch_clients().await.unwrap();
}

#[tokio::test]
async fn test_failed_login_surfaces_authentication_error() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.Invalid" }
        })))
        .mount(&server)
        .await;

    let err = gateway.fetch_clients().await.unwrap_err();
    assert!(err.is_auth(), "got {err:?}");
}

#[tokio::test]
async fn test_login_server_error_is_not_reported_as_bad_credentials() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = gateway.fetch_clients().await.unwrap_err();
    assert!(!err.is_auth(), "got {err:?}");
    assert!(matches!(err, CoreError::Operation { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_throttled_login_waits_out_backoff() {
    let (server, gateway) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ok_envelope(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = gateway.fetch_clients().await.unwrap_err();

    assert!(
        matches!(err, CoreError::RateLimited { retry_after_secs: 2 }),
        "got {err:?}"
    );
    // The hint exceeds max_backoff, so the wait is capped at 40ms.
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(
        gateway.rate_limiter().current_backoff(),
        Some(Duration::from_millis(10))
    );
    assert!(!gateway.session().unwrap().is_valid().await);
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_maps_to_permission() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/stamgr"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = gateway.block(&mac(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Permission { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_throttled_call_backs_off() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .mount(&server)
        .await;

    let err = gateway.fetch_clients().await.unwrap_err();
    assert!(
        matches!(err, CoreError::RateLimited { retry_after_secs: 1 }),
        "got {err:?}"
    );
    assert!(err.is_retryable());
    assert!(gateway.rate_limiter().current_backoff().is_some());
}

/// Stamps the arrival time of every request it answers.
struct ArrivalLog {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    response: ResponseTemplate,
}

impl Respond for ArrivalLog {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        self.response.clone()
    }
}

#[tokio::test]
async fn test_gateways_sharing_a_limiter_respect_one_ceiling() {
    let interval = Duration::from_millis(30);
    let limiter = RateLimiter::shared(RateLimitConfig {
        min_interval: interval,
        ..RateLimitConfig::default()
    });
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ArrivalLog {
            arrivals: arrivals.clone(),
            response: ok_envelope(json!([])),
        })
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ArrivalLog {
            arrivals: arrivals.clone(),
            response: ok_envelope(json!([])),
        })
        .mount(&server)
        .await;

    let config = config_for(&server);
    let first = gateway_on(&server, &config, limiter.clone());
    let second = gateway_on(&server, &config, limiter);

    let started = Instant::now();
    let results: [Result<Vec<RawClient>, CoreError>; 6] = tokio::join!(
        first.fetch_clients(),
        second.fetch_clients(),
        first.fetch_clients(),
        second.fetch_clients(),
        first.fetch_clients(),
        second.fetch_clients(),
    )
    .into();
    for result in results {
        assert!(result.unwrap().is_empty());
    }

    // Two logins plus six listings, one slot each.
    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 8);
    let last = arrivals.iter().max().unwrap();
    assert!(
        last.duration_since(started) >= interval * 7,
        "8 requests finished after {:?}",
        last.duration_since(started)
    );
}

#[tokio::test]
async fn test_empty_confirmation_is_a_failure() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/stamgr"))
        .respond_with(ok_envelope(json!([])))
        .mount(&server)
        .await;

    let err = gateway.unblock(&mac(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Operation { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_blocked_clients_filters_and_normalizes() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/rest/user"))
        .respond_with(ok_envelope(json!([
            { "mac": "AA:BB:CC:DD:EE:01", "blocked": true },
            { "mac": "aa:bb:cc:dd:ee:02", "blocked": false },
            { "mac": "aa:bb:cc:dd:ee:03" }
        ])))
        .mount(&server)
        .await;

    assert_eq!(gateway.fetch_blocked_clients().await.unwrap(), vec![mac(1)]);
}

#[tokio::test]
async fn test_blocked_clients_failure_yields_empty_list() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/rest/user"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    assert!(gateway.fetch_blocked_clients().await.unwrap().is_empty());
}

// ── Batch execution ─────────────────────────────────────────────────

#[tokio::test]
async fn test_block_many_continues_after_failure() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/stamgr"))
        .and(body_partial_json(json!({ "mac": "aa:bb:cc:dd:ee:02" })))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/stamgr"))
        .and(body_partial_json(json!({ "cmd": "block-sta" })))
        .respond_with(ok_envelope(json!([{ "mac": "aa:bb:cc:dd:ee:01", "blocked": true }])))
        .expect(2)
        .mount(&server)
        .await;

    let executor = BatchExecutor::new(gateway).with_delay(Duration::from_millis(10));
    let report = executor.block_many(&[mac(1), mac(2), mac(3)]).await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.outcomes[0].mac, mac(1));
    assert!(report.outcomes[0].success);
    assert!(report.outcomes[0].error.is_none());
    assert!(!report.outcomes[1].success);
    assert!(report.outcomes[1].error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(report.outcomes[2].success);
}

#[tokio::test]
async fn test_unblock_many_spaces_items() {
    let (server, gateway) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/s/default/cmd/stamgr"))
        .and(body_partial_json(json!({ "cmd": "unblock-sta" })))
        .respond_with(ok_envelope(json!([{}])))
        .expect(3)
        .mount(&server)
        .await;

    let delay = Duration::from_millis(30);
    let executor = BatchExecutor::new(gateway).with_delay(delay);
    let started = Instant::now();
    let report = executor.unblock_many(&[mac(1), mac(2), mac(3)]).await;

    assert!(report.all_succeeded());
    assert!(started.elapsed() >= delay * 2);
}

#[tokio::test]
async fn test_empty_batch_makes_no_requests() {
    let (_server, gateway) = setup().await;
    let report = BatchExecutor::new(gateway).block_many(&[]).await;
    assert!(report.outcomes.is_empty());
}
