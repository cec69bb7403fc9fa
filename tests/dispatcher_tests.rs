//! Integration tests for request dispatching against a mocked API.
//!
//! These tests verify signing, error mapping and retry behavior of the
//! family dispatchers built by `Exoscale`.

use std::collections::HashMap;
use std::time::Duration;

use exoscale::clients::{ApiError, HttpError, HttpMethod, HttpRequest};
use exoscale::{Clearable, Exoscale, ExoscaleConfig, ExoscaleConfigBuilder};
use serde::Deserialize;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn builder(endpoint: &str) -> ExoscaleConfigBuilder {
    ExoscaleConfig::builder()
        .api_key("EXOtestkey")
        .api_secret("test-secret")
        .compute_api_endpoint(endpoint)
        .max_retries(0)
}

fn client(config: ExoscaleConfig) -> Exoscale {
    Exoscale::with_environment(config, &HashMap::<String, String>::new()).unwrap()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Instance {
    id: Option<String>,
    name: Option<String>,
}

impl Clearable for Instance {
    fn clear(&mut self) {
        self.id = None;
        self.name = None;
    }
}

// ============================================================================
// Successful requests
// ============================================================================

#[tokio::test]
async fn test_get_returns_parsed_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [{"name": "ch-gva-2"}, {"name": "de-fra-1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();

    let zones = assert_ok!(client.compute.send(request).await);
    assert_eq!(zones.snapshot()["zones"][1]["name"], "de-fra-1");
}

#[tokio::test]
async fn test_requests_are_signed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/instance"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instances": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Get, "instance").build().unwrap();
    assert_ok!(client.compute.send(request).await);

    let received = server.received_requests().await.unwrap();
    let authorization = received[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(authorization.starts_with("EXO2-HMAC-SHA256 credential=EXOtestkey,"));
    assert!(authorization.contains(",expires="));
    assert!(authorization.contains(",signature="));
    assert!(!authorization.contains("test-secret"));
}

#[tokio::test]
async fn test_query_and_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/instance"))
        .and(query_param("zone", "ch-gva-2"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "web-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Post, "instance")
        .query_param("zone", "ch-gva-2")
        .body(json!({"name": "web-1"}))
        .build()
        .unwrap();

    let operation = assert_ok!(client.compute.send(request).await);
    assert_eq!(operation.snapshot(), json!({"id": "op-1"}));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/instance/42"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Delete, "instance/42").build().unwrap();

    let result = assert_ok!(client.compute.send(request).await);
    assert!(result.snapshot().is_null());
}

#[tokio::test]
async fn test_reset_is_visible_through_every_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/instance/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42", "name": "web"})))
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Get, "instance/42")
        .single_resource()
        .build()
        .unwrap();

    let instance = assert_ok!(client.compute.send_as::<Instance>(request).await);
    let held_by_cache = instance.clone();
    assert_eq!(held_by_cache.snapshot().name.as_deref(), Some("web"));

    instance.reset();
    assert_eq!(
        held_by_cache.snapshot(),
        Instance {
            id: None,
            name: None
        }
    );
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_single_resource_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/instance/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such instance"})))
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Get, "instance/missing")
        .single_resource()
        .build()
        .unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(error.is_not_found());
    assert!(matches!(error, HttpError::Api(ApiError::NotFound)));
}

#[tokio::test]
async fn test_find_reports_absence_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/instance/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/instance/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42", "name": "web"})))
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());

    let missing = HttpRequest::builder(HttpMethod::Get, "instance/missing").build().unwrap();
    assert!(assert_ok!(client.compute.find::<Instance>(missing).await).is_none());

    let present = HttpRequest::builder(HttpMethod::Get, "instance/42").build().unwrap();
    let instance = assert_ok!(client.compute.find::<Instance>(present).await).unwrap();
    assert_eq!(instance.snapshot().id.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_list_404_is_a_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/unknown"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest::builder(HttpMethod::Get, "unknown").build().unwrap();

    match assert_err!(client.compute.send(request).await) {
        HttpError::Api(ApiError::Response { status, error, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(error, json!("Not Found"));
        }
        other => panic!("expected a response error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_provider_payload() {
    let server = MockServer::start().await;
    let payload = json!({"message": "internal failure", "code": "E500"});
    Mock::given(method("GET"))
        .and(path("/v2/instance/42"))
        .respond_with(ResponseTemplate::new(500).set_body_json(&payload))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).max_retries(3).build());
    let request = HttpRequest::builder(HttpMethod::Get, "instance/42")
        .single_resource()
        .build()
        .unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(!error.is_not_found());
    match error {
        HttpError::Api(api) => {
            assert_eq!(api.status(), 500);
            assert_eq!(api.reason(), "internal failure");
            let ApiError::Response { error, .. } = api else {
                panic!("expected a response error");
            };
            assert_eq!(error, payload);
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(builder(&format!("{}/v2", server.uri())).build());
    let request = HttpRequest {
        http_method: HttpMethod::Post,
        path: "instance".to_string(),
        body: None,
        query: None,
        extra_headers: None,
        single_resource: false,
    };

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::InvalidRequest(_)));
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test]
async fn test_forcelisted_status_is_retried_for_idempotent_methods() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zones": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = builder(&format!("{}/v2", server.uri()))
        .max_retries(3)
        .backoff_factor(0.0)
        .status_forcelist([503])
        .build();
    let client = client(config);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();

    let zones = assert_ok!(client.compute.send(request).await);
    assert_eq!(zones.snapshot(), json!({"zones": []}));
}

#[tokio::test]
async fn test_forcelisted_status_is_not_retried_for_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/instance"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = builder(&format!("{}/v2", server.uri()))
        .max_retries(3)
        .backoff_factor(0.0)
        .status_forcelist([503])
        .build();
    let client = client(config);
    let request = HttpRequest::builder(HttpMethod::Post, "instance")
        .body(json!({}))
        .build()
        .unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Api(ApiError::Response { status: 503, .. })));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_request_error() {
    let config = builder("http://127.0.0.1:1/v2")
        .max_retries(1)
        .backoff_factor(0.0)
        .build();
    let client = client(config);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Request(_)));
}

#[tokio::test]
async fn test_timed_out_post_is_not_replayed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/instance"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "op-1"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = builder(&format!("{}/v2", server.uri()))
        .timeout(Duration::from_millis(100))
        .max_retries(2)
        .backoff_factor(0.0)
        .build();
    let client = client(config);
    let request = HttpRequest::builder(HttpMethod::Post, "instance")
        .body(json!({"name": "web-1"}))
        .build()
        .unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Request(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_timed_out_get_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"zones": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = builder(&format!("{}/v2", server.uri()))
        .timeout(Duration::from_millis(100))
        .max_retries(2)
        .backoff_factor(0.0)
        .build();
    let client = client(config);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Request(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
