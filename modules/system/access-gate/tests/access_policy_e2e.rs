#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests for the access gate
//!
//! These tests verify that:
//! 1. `health` and `info` are reachable without credentials
//! 2. Every other management endpoint and every application path demands basic auth
//! 3. The 401 response carries the basic challenge
//! 4. Authenticated requests reach handlers with the principal's `SecurityContext`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use access_gate::{AccessGate, GateConfig};
use async_trait::async_trait;
use authn_resolver_sdk::{
    AuthNResolverClient, AuthNResolverError, AuthenticationResult, BasicCredentials,
};
use axum::{
    Extension, Json, Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
    routing::get,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gate_security::SecurityContext;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use static_authn_plugin::{Service, StaticAuthNPluginConfig, UserConfig};
use tower::ServiceExt;

async fn status_up() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

/// Handler echoing the `SecurityContext` inserted by the gate
async fn whoami(Extension(ctx): Extension<SecurityContext>) -> Json<Value> {
    Json(json!({
        "subject": ctx.subject(),
        "authenticated": ctx.is_authenticated(),
        "roles": ctx.roles(),
    }))
}

fn routes() -> Router {
    Router::new()
        .route("/actuator/health", get(whoami))
        .route("/actuator/health/{*component}", get(status_up))
        .route("/actuator/info", get(status_up))
        .route("/actuator/metrics", get(status_up))
        .route("/actuator/env", get(status_up).post(status_up))
        .route("/api/v1/config", get(whoami).post(whoami))
        .fallback(|| async { StatusCode::NOT_FOUND })
}

fn static_users() -> Arc<dyn AuthNResolverClient> {
    Arc::new(Service::from_config(&StaticAuthNPluginConfig {
        users: vec![UserConfig::new("ops", "s3cret", &["ACTUATOR"])],
    }))
}

fn app_with(config: GateConfig, authn: Arc<dyn AuthNResolverClient>) -> Router {
    let gate = AccessGate::new(config, authn).expect("gate config is valid");
    gate.apply(routes())
}

fn app() -> Router {
    app_with(GateConfig::default(), static_users())
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

async fn send(router: Router, method: Method, uri: &str, auth: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .expect("request failed")
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn challenge(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn health_is_public_and_anonymous() {
    let response = send(app(), Method::GET, "/actuator/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["subject"], Value::Null);
}

#[tokio::test]
async fn health_components_are_public() {
    let response = send(app(), Method::GET, "/actuator/health/liveness", None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn info_is_public() {
    let response = send(app(), Method::GET, "/actuator/info", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "UP");
}

#[tokio::test]
async fn metrics_without_credentials_is_challenged() {
    let response = send(app(), Method::GET, "/actuator/metrics", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(challenge(&response), Some("Basic realm=\"Realm\""));
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some(access_gate::problem::APPLICATION_PROBLEM_JSON)
    );
    let body = body_json(response).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["instance"], "/actuator/metrics");
}

#[tokio::test]
async fn metrics_with_valid_credentials_passes() {
    let auth = basic("ops", "s3cret");
    let response = send(app(), Method::GET, "/actuator/metrics", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn state_changing_request_needs_no_csrf_token() {
    let auth = basic("ops", "s3cret");
    let response = send(app(), Method::POST, "/actuator/env", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn application_path_without_credentials_is_challenged() {
    let response = send(app(), Method::GET, "/api/v1/config", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(challenge(&response).is_some());
}

#[tokio::test]
async fn application_path_with_credentials_sees_principal() {
    let auth = basic("ops", "s3cret");
    let response = send(app(), Method::POST, "/api/v1/config", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subject"], "ops");
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["roles"], json!(["ACTUATOR"]));
}

#[tokio::test]
async fn wrong_password_is_challenged() {
    let auth = basic("ops", "guess");
    let response = send(app(), Method::GET, "/api/v1/config", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(challenge(&response).is_some());
    assert_eq!(body_json(response).await["detail"], "Authentication failed");
}

#[tokio::test]
async fn bearer_token_is_not_accepted() {
    let response = send(
        app(),
        Method::GET,
        "/actuator/metrics",
        Some("Bearer abc.def.ghi"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(challenge(&response).is_some());
}

#[tokio::test]
async fn unknown_path_is_gated_before_fallback() {
    let response = send(app(), Method::GET, "/does/not/exist", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let auth = basic("ops", "s3cret");
    let response = send(app(), Method::GET, "/does/not/exist", Some(&auth)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unexposed_endpoint_is_treated_as_application_path() {
    let config: GateConfig = serde_json::from_value(json!({
        "management": { "exposed": ["metrics"] }
    }))
    .unwrap();
    let app = app_with(config, static_users());

    // `health` is no longer a management endpoint, so the catch-all applies.
    let response = send(app, Method::GET, "/actuator/health", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn custom_realm_is_announced() {
    let config = GateConfig {
        realm: "config-server".to_owned(),
        ..GateConfig::default()
    };
    let response = send(
        app_with(config, static_users()),
        Method::GET,
        "/actuator/metrics",
        None,
    )
    .await;

    assert_eq!(challenge(&response), Some("Basic realm=\"config-server\""));
}

#[tokio::test]
async fn response_carries_request_id() {
    let response = send(app(), Method::GET, "/actuator/health", None).await;

    assert!(response.headers().contains_key("x-request-id"));
}

/// Verifier that counts calls and answers with a fixed error
struct CountingClient {
    calls: AtomicUsize,
    error: fn() -> AuthNResolverError,
}

#[async_trait]
impl AuthNResolverClient for CountingClient {
    async fn authenticate(
        &self,
        _credentials: &BasicCredentials,
    ) -> Result<AuthenticationResult, AuthNResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.error)())
    }
}

#[tokio::test]
async fn public_endpoint_does_not_consult_verifier_even_with_credentials() {
    let client = Arc::new(CountingClient {
        calls: AtomicUsize::new(0),
        error: || AuthNResolverError::Unauthorized("nope".to_owned()),
    });
    let app = app_with(GateConfig::default(), client.clone());

    let auth = basic("ops", "wrong");
    let response = send(app, Method::GET, "/actuator/health", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_credentials_do_not_reach_verifier() {
    let client = Arc::new(CountingClient {
        calls: AtomicUsize::new(0),
        error: || AuthNResolverError::Unauthorized("nope".to_owned()),
    });
    let app = app_with(GateConfig::default(), client.clone());

    let response = send(app, Method::GET, "/actuator/metrics", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn verifier_outage_maps_to_503() {
    let client = Arc::new(CountingClient {
        calls: AtomicUsize::new(0),
        error: || AuthNResolverError::ServiceUnavailable("ldap down".to_owned()),
    });
    let app = app_with(GateConfig::default(), client.clone());

    let auth = basic("ops", "s3cret");
    let response = send(app, Method::GET, "/actuator/metrics", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(challenge(&response).is_none());
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn verifier_internal_error_maps_to_500() {
    let client = Arc::new(CountingClient {
        calls: AtomicUsize::new(0),
        error: || AuthNResolverError::Internal("boom".to_owned()),
    });
    let app = app_with(GateConfig::default(), client);

    let auth = basic("ops", "s3cret");
    let response = send(app, Method::GET, "/api/v1/config", Some(&auth)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
