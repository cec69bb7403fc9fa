//! Integration tests for request/response tracing.
//!
//! A capturing subscriber is installed on the test thread; `#[tokio::test]`
//! runs every future on that thread, so all client events reach it.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use exoscale::clients::{HttpError, HttpMethod, HttpRequest, TRACE_TARGET};
use exoscale::{Exoscale, ExoscaleConfig};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    fn trace_events(&self) -> usize {
        self.contents().matches(&format!("{TRACE_TARGET}:")).count()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

fn client(endpoint: &str, trace: bool) -> Exoscale {
    let config = ExoscaleConfig::builder()
        .api_key("EXOtracekey")
        .api_secret("trace-secret")
        .compute_api_endpoint(endpoint)
        .max_retries(0)
        .trace(trace)
        .build();
    Exoscale::with_environment(config, &HashMap::<String, String>::new()).unwrap()
}

#[tokio::test]
async fn test_successful_exchange_emits_one_event_with_both_blocks() {
    let (captured, _guard) = capture();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zones": []})))
        .mount(&server)
        .await;

    let client = client(&format!("{}/v2", server.uri()), true);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();
    let zones = assert_ok!(client.compute.send(request).await);
    assert_eq!(zones.snapshot(), json!({"zones": []}));

    let output = captured.contents();
    assert_eq!(captured.trace_events(), 1);
    assert!(output.contains(">>> GET "));
    assert!(output.contains("<<< 200 OK"));
    assert!(output.contains(r#"body:{"zones":[]}"#));
    assert!(output.find(">>>").unwrap() < output.find("<<<").unwrap());
}

#[tokio::test]
async fn test_error_status_is_traced_and_still_returned() {
    let (captured, _guard) = capture();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = client(&format!("{}/v2", server.uri()), true);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();
    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Api(_)));

    assert_eq!(captured.trace_events(), 1);
    assert!(captured.contents().contains("<<< 503 Service Unavailable"));
}

#[tokio::test]
async fn test_transport_failure_emits_no_trace() {
    let (captured, _guard) = capture();
    let client = client("http://127.0.0.1:1/v2", true);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();

    let error = assert_err!(client.compute.send(request).await);
    assert!(matches!(error, HttpError::Request(_)));
    assert_eq!(captured.trace_events(), 0);
    assert!(!captured.contents().contains(">>>"));
}

#[tokio::test]
async fn test_tracing_disabled_emits_nothing() {
    let (captured, _guard) = capture();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&format!("{}/v2", server.uri()), false);
    let request = HttpRequest::builder(HttpMethod::Get, "zone").build().unwrap();
    assert_ok!(client.compute.send(request).await);

    assert_eq!(captured.trace_events(), 0);
}
