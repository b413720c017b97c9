#![allow(clippy::unwrap_used)]
// Integration tests for `SdwanClient` and `TokenClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{
    basic_auth, bearer_token, body_partial_json, body_string_contains, header, method, path,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitepulse_api::{
    Error, MetricFilter, MetricSpec, MetricView, RetryOutcome, RetryPolicy, SdwanClient,
    SysMetricsQuery, TokenClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

const INTERFACES_PATH: &str = "/sdwan/v4.21/api/sites/site-1/elements/elem-1/interfaces";
const METRICS_PATH: &str = "/sdwan/monitor/v2.3/api/monitor/sys_metrics";

async fn setup() -> (MockServer, SdwanClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = SdwanClient::with_client(
        reqwest::Client::new(),
        base_url,
        SecretString::from("test-token"),
    )
    .with_region("sg")
    .with_retry(RetryPolicy::immediate(7));
    (server, client)
}

fn query() -> SysMetricsQuery {
    SysMetricsQuery {
        start_time: "2024-01-01T00:00:00.000Z".into(),
        end_time: "2024-01-03T00:00:00.000Z".into(),
        interval: "1day".into(),
        metrics: vec![MetricSpec::average("CPUUsage", "percentage")],
        filter: MetricFilter {
            site: vec!["site-1".into()],
            element: vec!["elem-1".into()],
            interface: None,
        },
        view: None,
    }
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_token_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .and(basic_auth("svc@tenant", "s3cret"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=tsg_id%3A1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc.def",
            "token_type": "Bearer",
            "expires_in": 899,
            "scope": "tsg_id:1234"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        TokenClient::with_client(reqwest::Client::new(), Url::parse(&server.uri()).unwrap());
    let token = client
        .request_token("svc@tenant", &SecretString::from("s3cret"), "1234")
        .await
        .unwrap();

    assert_eq!(token.access_token.expose_secret(), "abc.def");
    assert_eq!(token.expires_in.map(|d| d.as_secs()), Some(899));
}

#[tokio::test]
async fn test_token_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let client =
        TokenClient::with_client(reqwest::Client::new(), Url::parse(&server.uri()).unwrap());
    let result = client
        .request_token("svc", &SecretString::from("wrong"), "1234")
        .await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Inventory tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_elements() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/sdwan/v3.1/api/elements"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "elem-1",
                "site_id": "site-1",
                "name": "DC-Jakarta",
                "model_name": "ion 3200",
                "hw_id": "hw-1",
                "software_version": "6.1.2",
                "serial_number": "SN001"
            }, {
                "id": "elem-2",
                "site_id": "site-2"
            }]
        })))
        .mount(&server)
        .await;

    let elements = client.list_elements().await.unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].name.as_deref(), Some("DC-Jakarta"));
    assert_eq!(elements[1].serial_number, None);
}

#[tokio::test]
async fn test_list_sites() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/sdwan/v4.8/api/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "site-1", "name": "HQ", "address": {"city": "Jakarta"}}]
        })))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["address"]["city"], json!("Jakarta"));
}

// ── Monitor tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_interfaces() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(INTERFACES_PATH))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "if-1", "name": "1",
                 "ipv4_config": {"type": "static", "static_config": {"address": "10.1.1.1/30"}}},
                {"id": "if-2", "name": "2", "ipv4_config": {"type": "dhcp"}},
                {"id": "if-3", "name": "controller 1", "ipv4_config": null}
            ]
        })))
        .mount(&server)
        .await;

    let interfaces = client.list_interfaces("site-1", "elem-1").await.unwrap();
    assert_eq!(interfaces.len(), 3);
    assert_eq!(interfaces[0].id, "if-1");
    assert!(interfaces[2].ipv4_config.is_none());
}

#[tokio::test]
async fn test_sys_metrics_sends_region_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(bearer_token("test-token"))
        .and(header("X-PANW-Region", "sg"))
        .and(body_partial_json(json!({
            "interval": "1day",
            "filter": {"site": ["site-1"], "element": ["elem-1"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metrics": [{"series": [{
                "name": "CPUUsage",
                "unit": "percentage",
                "data": [{"datapoints": [
                    {"time": "2024-01-01T00:00:00Z", "value": 10.0},
                    {"time": "2024-01-02T00:00:00Z", "value": 20.0}
                ]}]
            }]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.sys_metrics(&query()).await.unwrap();
    let series = &resp.metrics[0].series[0];
    assert_eq!(series.name, "CPUUsage");
    assert_eq!(series.data[0].datapoints.len(), 2);
}

#[tokio::test]
async fn test_sys_metrics_interface_view() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .and(body_partial_json(json!({
            "filter": {"interface": ["if-1"]},
            "view": {"individual": "interface", "summary": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metrics": [{"series": [
                {"name": "InterfaceBandwidthUsage", "view": "interface", "data": []},
                {"name": "InterfaceBandwidthUsage", "view": "summary", "data": []}
            ]}]
        })))
        .mount(&server)
        .await;

    let mut q = query();
    q.metrics = vec![MetricSpec::average("InterfaceBandwidthUsage", "Mbps")];
    q.filter.interface = Some(vec!["if-1".into()]);
    q.view = Some(MetricView::interface_summary());

    let resp = client.sys_metrics(&q).await.unwrap();
    let summaries: Vec<_> = resp.metrics[0]
        .series
        .iter()
        .filter(|s| s.is_summary())
        .collect();
    assert_eq!(summaries.len(), 1);
}

// ── Error handling tests ────────────────────────────────────────────

#[tokio::test]
async fn test_retry_exhaustion_makes_exact_attempts() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(7)
        .mount(&server)
        .await;

    let outcome = client.sys_metrics_tagged(&query()).await;
    match outcome {
        RetryOutcome::Exhausted { error, attempts } => {
            assert_eq!(attempts, 7);
            assert_eq!(error.status(), Some(503));
        }
        other => panic!("expected exhaustion, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_status_error_surfaces_after_retries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(INTERFACES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such element"))
        .expect(7)
        .mount(&server)
        .await;

    let result = client.list_interfaces("site-1", "elem-1").await;
    match result {
        Err(Error::Http {
            status, preview, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(preview, "no such element");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client.sys_metrics_tagged(&query()).await;
    assert!(
        matches!(
            outcome,
            RetryOutcome::Aborted {
                error: Error::Deserialization { .. },
                attempts: 1
            }
        ),
        "expected single aborted attempt, got: {outcome:?}"
    );
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/sdwan/v3.1/api/elements"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sdwan/v3.1/api/elements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let elements = client.list_elements().await.unwrap();
    assert!(elements.is_empty());
}
