//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(base_url: String) -> ClientConfig {
    ClientConfig::builder()
        .base_url(base_url)
        .backoff(Duration::from_millis(10), Duration::from_secs(1))
        .build()
}

#[test]
fn test_client_config_default() {
    let config = ClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry.max_retries, 3);
    assert!(config.base_url.is_none());
    assert!(config.throttle.is_none());
    assert!(config.user_agent.starts_with("sensorgrid-client/"));
}

#[test]
fn test_client_config_builder() {
    let config = ClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(Duration::from_millis(200), Duration::from_secs(30))
        .throttle(ThrottleConfig::new(50, 25))
        .header("X-Env", "staging")
        .user_agent("probe/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.base_delay, Duration::from_millis(200));
    assert_eq!(config.retry.max_delay, Duration::from_secs(30));
    assert!(config.throttle.is_some());
    assert_eq!(
        config.default_headers.get("X-Env"),
        Some(&"staging".to_string())
    );
    assert_eq!(config.user_agent, "probe/1.0");
}

#[test]
fn test_request_options_builder() {
    let options = RequestOptions::new()
        .query("site", "plant-7")
        .header("X-Request-Id", "abc123")
        .timeout(Duration::from_secs(10))
        .retries(2);

    assert_eq!(options.query.get("site"), Some(&"plant-7".to_string()));
    assert_eq!(
        options.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert_eq!(options.timeout, Some(Duration::from_secs(10)));
    assert_eq!(options.max_retries, Some(2));

    let single = RequestOptions::new().no_retry();
    assert_eq!(single.max_retries, Some(0));
}

#[tokio::test]
async fn test_get_parses_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/readings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "readings": [{"sensor": "s-1", "value": 21.5}]
        })))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let body = client.get("/v1/readings").await.unwrap();

    assert_eq!(body["readings"][0]["sensor"], "s-1");
}

#[tokio::test]
async fn test_get_sends_query_and_accept_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/readings"))
        .and(query_param("site", "plant-7"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    client
        .get_with("/v1/readings", RequestOptions::new().query("site", "plant-7"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_attaches_api_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/secure"))
        .and(header("X-API-Key", "secret123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = RestClient::with_auth(
        fast_config(mock_server.uri()),
        AuthConfig::api_key("secret123"),
    );
    let body = client.get("/v1/secure").await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_404_surfaced_after_exactly_one_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let err = client.get("/v1/missing").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_retry_on_500_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let body = client.get("/v1/flaky").await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_persistent_500_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(2)
        .backoff(Duration::from_millis(10), Duration::from_secs(1))
        .build();

    let client = RestClient::new(config);
    let err = client.get("/v1/broken").await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 3 }));
}

#[tokio::test]
async fn test_429_retries_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let body = client.get("/v1/limited").await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_429_with_no_budget_carries_wait_hint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let err = client
        .get_with("/v1/limited", RequestOptions::new().no_retry())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimitExceeded {
            retry_after_seconds: 3
        }
    ));
}

#[tokio::test]
async fn test_401_without_refreshing_provider_is_permanent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/private"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::with_auth(
        fast_config(mock_server.uri()),
        AuthConfig::api_key("wrong-key"),
    );
    let err = client.get("/v1/private").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_timeout_surfaced_when_budget_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .max_retries(0)
        .build();

    let client = RestClient::new(config);
    let err = client.get("/v1/slow").await.unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_post_is_single_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/exports"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let err = client
        .post("/v1/exports", serde_json::json!({"range": "2026-08"}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_post_returns_parsed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/exports"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 123,
            "created": true
        })))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let body = client
        .post("/v1/exports", serde_json::json!({"range": "2026-08"}))
        .await
        .unwrap();

    assert_eq!(body["id"], 123);
}

#[tokio::test]
async fn test_post_429_maps_to_rate_limit_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/exports"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "9"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    let err = client
        .post("/v1/exports", serde_json::json!({}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimitExceeded {
            retry_after_seconds: 9
        }
    ));
}

#[tokio::test]
async fn test_metrics_count_attempts_and_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/bad"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));

    client.get("/v1/good").await.unwrap();
    client.get("/v1/good").await.unwrap();
    client.get("/v1/bad").await.unwrap_err();

    let snapshot = client.metrics();
    assert_eq!(snapshot.request_count, 3);
    assert_eq!(snapshot.error_count, 1);
    assert!((snapshot.error_rate - 1.0 / 3.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_metrics_count_every_retry_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config(mock_server.uri()));
    client.get("/v1/flaky").await.unwrap();

    // One failed attempt plus the successful one
    let snapshot = client.metrics();
    assert_eq!(snapshot.request_count, 2);
    assert_eq!(snapshot.error_count, 1);
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_sending() {
    let client = RestClient::new(ClientConfig::default());
    let err = client.get("not a url").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[tokio::test]
async fn test_full_url_bypasses_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = RestClient::new(fast_config("https://unused.example.com".to_string()));
    client
        .get(&format!("{}/v1/other", mock_server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_throttled_client_still_completes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/readings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .throttle(ThrottleConfig::new(100, 10))
        .build();

    let client = RestClient::new(config);
    assert!(client.has_throttle());

    for _ in 0..3 {
        client.get("/v1/readings").await.unwrap();
    }
}

#[test]
fn test_client_debug_omits_secrets() {
    let client = RestClient::with_auth(ClientConfig::default(), AuthConfig::api_key("k3y"));
    let printed = format!("{client:?}");
    assert!(printed.contains("RestClient"));
    assert!(!printed.contains("k3y"));
}
