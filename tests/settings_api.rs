//! Admin surface tests, driven in-process through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use relay_settings::settings::validation::HOST_MISSING;

mod common;

use common::{full_form, Harness, API_KEY};

fn authed(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

async fn send(harness: &Harness, request: Request<Body>) -> (StatusCode, Value) {
    let response = harness.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_requires_bearer_key() {
    let harness = Harness::with_failing_relay();

    let request = Request::builder().uri("/settings").body(Body::empty()).unwrap();
    let (status, _) = send(&harness, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/settings")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&harness, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = harness.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_live_field_checks() {
    let harness = Harness::with_failing_relay();

    let (status, body) = send(&harness, authed("GET", "/settings/check/actionHubMqHost?value=", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"kind": "error", "message": HOST_MISSING}));

    let (_, body) = send(&harness, authed("GET", "/settings/check/actionHubMqHost?value=mq.local", Body::empty())).await;
    assert_eq!(body, json!({"kind": "ok"}));

    let (_, body) = send(&harness, authed("GET", "/settings/check/actionHubMqPort?value=0", Body::empty())).await;
    assert_eq!(body["kind"], "error");

    let (status, _) = send(&harness, authed("GET", "/settings/check/somethingElse?value=x", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_then_read_back_redacted() {
    let harness = Harness::with_failing_relay();

    let form = full_form("alpha");
    let (status, outcome) = send(&harness, authed("POST", "/settings", Body::from(form.to_string()))).await;

    // The relay is down, but the submission still succeeds with a warning.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["relayFieldsPresent"], true);
    assert_eq!(outcome["relaySettingsValid"], true);
    assert!(outcome["reinitWarning"].as_str().unwrap().contains("did not respond"));

    let (status, view) = send(&harness, authed("GET", "/settings", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["useGlobal"], true);
    assert_eq!(view["connectionFactory"]["url"], "https://alpha.example.com");
    assert_eq!(view["connectionFactory"]["passwordSet"], true);
    assert_eq!(view["broker"]["host"], "mq-alpha.example.com");
    assert_eq!(view["broker"]["port"], 5672);
    assert_eq!(view["filters"]["includeMode"], "selected");
    assert_eq!(view["filters"]["build"], true);
    assert_eq!(view["relaySettingsValid"], true);

    let text = view.to_string();
    assert!(!text.contains("alpha-secret"));
    assert!(!text.contains("alpha-mq-secret"));

    assert_eq!(harness.store.mq_password(), "alpha-mq-secret");
}

#[tokio::test]
async fn test_incomplete_broker_settings_are_saved_with_warnings() {
    let harness = Harness::with_failing_relay();

    let mut form = full_form("beta");
    form["actionHubMqExchange"] = json!("");
    let (status, outcome) = send(&harness, authed("POST", "/settings", Body::from(form.to_string()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["relaySettingsValid"], false);
    assert_eq!(outcome["fieldWarnings"][0]["field"], "actionHubMqExchange");
    assert!(!harness.store.are_settings_valid());
    assert_eq!(harness.store.mq_host(), "mq-beta.example.com");
}

#[tokio::test]
async fn test_malformed_submissions_are_rejected() {
    let harness = Harness::with_failing_relay();

    let mut form = full_form("gamma");
    form["connectionFactory"]["url"] = json!("::not a url::");
    let (status, body) = send(&harness, authed("POST", "/settings", Body::from(form.to_string()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("connectionFactory.url"));
    assert!(harness.store.connection_factory().is_none());
    assert_eq!(harness.store.mq_host(), "");

    let (status, _) = send(&harness, authed("POST", "/settings", Body::from("{ nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_endpoints() {
    let harness = Harness::with_failing_relay();

    let (status, body) = send(&harness, authed("GET", "/admin/status", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["relaySettingsValid"], false);
    assert_eq!(body["useGlobal"], false);

    let (status, body) = send(&harness, authed("GET", "/relay/status", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert!(body.get("lastError").is_some());
}
