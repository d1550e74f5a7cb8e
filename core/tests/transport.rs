//! Request execution against ad-hoc stub routes.
//!
//! Each test serves its own `Router` so the response under test is exactly
//! what the handler writes.

use std::thread;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use mock_server::StubServer;
use noraina_core::{ApiError, ClientConfig, Context, HttpMethod, InstanceRequest, NorainaClient};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Foo {
    #[serde(rename = "A")]
    a: String,
}

fn client_for(server: &StubServer) -> NorainaClient {
    NorainaClient::anonymous(ClientConfig::new(server.url()), None).unwrap()
}

async fn echo_headers(headers: HeaderMap) -> Json<serde_json::Value> {
    let pick = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(serde_json::json!({
        "token": pick("x-access-token"),
        "content_type": pick("content-type"),
    }))
}

#[test]
fn decodes_success_body_into_target() {
    let server = StubServer::start(Router::new().route("/", get(|| async { r#"{"A":"a"}"# })))
        .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let body: Foo = client.execute(&Context::background(), &req).unwrap();

    assert_eq!(body, Foo { a: "a".to_string() });
}

#[test]
fn plain_text_400_is_an_error() {
    let server = StubServer::start(
        Router::new().route("/", get(|| async { (StatusCode::BAD_REQUEST, "Bad Request\n") })),
    )
    .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let err = client
        .execute_empty(&Context::background(), &req)
        .unwrap_err();

    assert!(matches!(err, ApiError::Deserialization(_)), "got {err:?}");
}

#[test]
fn json_400_is_structured_and_not_decoded() {
    let server = StubServer::start(Router::new().route(
        "/",
        get(|| async { (StatusCode::BAD_REQUEST, r#"{"status":"ko"}"#) }),
    ))
    .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let err = client
        .execute::<Foo>(&Context::background(), &req)
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "status: ko");
}

#[test]
fn empty_500_is_structured() {
    let server = StubServer::start(
        Router::new().route("/", get(|| async { StatusCode::INTERNAL_SERVER_ERROR })),
    )
    .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    match client.execute_empty(&Context::background(), &req) {
        Err(ApiError::Api(e)) => {
            assert_eq!(e.status_code, 500);
            assert!(e.message.is_empty());
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[test]
fn success_body_of_wrong_shape_fails_to_decode() {
    let server = StubServer::start(Router::new().route("/", get(|| async { "[1,2,3]" })))
        .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let err = client
        .execute::<Foo>(&Context::background(), &req)
        .unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}

#[test]
fn no_content_is_discarded() {
    let server =
        StubServer::start(Router::new().route("/", get(|| async { StatusCode::NO_CONTENT })))
            .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    client
        .execute_empty(&Context::background(), &req)
        .unwrap();
}

#[test]
fn token_header_reaches_server_only_when_set() {
    let server = StubServer::start(Router::new().route("/", get(echo_headers))).unwrap();
    let ctx = Context::background();

    let client = client_for(&server);
    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let seen: serde_json::Value = client.execute(&ctx, &req).unwrap();
    assert!(seen["token"].is_null());

    let client = client.with_token("mytoken");
    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let seen: serde_json::Value = client.execute(&ctx, &req).unwrap();
    assert_eq!(seen["token"], "mytoken");
}

#[test]
fn json_body_is_posted_with_content_type() {
    let server = StubServer::start(Router::new().route(
        "/api/instance",
        post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(serde_json::json!({ "content_type": content_type, "body": body }))
        }),
    ))
    .unwrap();
    let client = client_for(&server);

    let input = InstanceRequest {
        name: "test".to_string(),
        services: Vec::new(),
    };
    let req = client
        .build_request(HttpMethod::Post, "api/instance", Some(&input))
        .unwrap();
    let seen: serde_json::Value = client.execute(&Context::background(), &req).unwrap();

    assert_eq!(seen["content_type"], "application/json");
    assert_eq!(seen["body"], serde_json::json!({ "name": "test", "services": [] }));
}

#[test]
fn slow_response_hits_deadline() {
    let server = StubServer::start(Router::new().route(
        "/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    ))
    .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let ctx = Context::with_timeout(Duration::from_millis(200));
    let err = client.execute_empty(&ctx, &req).unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[test]
fn cancel_releases_caller_while_server_sleeps() {
    let server = StubServer::start(Router::new().route(
        "/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    ))
    .unwrap();
    let client = client_for(&server);
    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();

    let ctx = Context::cancellable();
    let canceller = ctx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        canceller.cancel();
    });

    let started = Instant::now();
    let err = client.execute_empty(&ctx, &req).unwrap_err();

    assert!(matches!(err, ApiError::Cancelled), "got {err:?}");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "cancel took {:?}",
        started.elapsed()
    );
}

#[test]
fn cancellable_context_still_returns_response() {
    let server = StubServer::start(Router::new().route("/", get(|| async { r#"{"A":"a"}"# })))
        .unwrap();
    let client = client_for(&server);

    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let body: Foo = client.execute(&Context::cancellable(), &req).unwrap();
    assert_eq!(body, Foo { a: "a".to_string() });
}

#[test]
fn closed_port_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        NorainaClient::anonymous(ClientConfig::new(format!("http://{addr}/")), None).unwrap();
    let req = client.build_empty_request(HttpMethod::Get, "/").unwrap();
    let err = client
        .execute_empty(&Context::background(), &req)
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}
