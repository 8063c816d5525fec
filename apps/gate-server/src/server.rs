//! HTTP surface of the gate server: the built-in management endpoints behind
//! the access gate, and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use access_gate::{AccessGate, EndpointResolver, Problem};
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

/// Built-in endpoints and the discovery page, wrapped by `gate`.
///
/// `health` and `info` are mounted only when exposed. Every other path falls
/// through to a `404` problem response, after the gate has decided.
#[must_use]
pub fn build_router(gate: &AccessGate) -> Router {
    let resolver = gate.resolver();
    let mut router: Router<Arc<Value>> = Router::new();

    if let Some(path) = resolver.endpoint_path("health") {
        router = router.route(path, get(health));
    }
    if let Some(path) = resolver.endpoint_path("info") {
        router = router.route(path, get(info));
    }
    if !resolver.prefix().is_empty() {
        router = router.route(resolver.prefix(), get(discovery));
    }

    let router = router
        .fallback(not_found)
        .with_state(Arc::new(discovery_links(resolver)));

    gate.apply(router)
}

/// Bind `addr` and serve `router` until `cancel` fires.
///
/// # Errors
/// Returns an error if the socket cannot be bound or the server fails.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    // Graceful shutdown on cancel
    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn info() -> Json<Value> {
    Json(json!({
        "app": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}

async fn discovery(State(links): State<Arc<Value>>) -> Json<Value> {
    Json(links.as_ref().clone())
}

async fn not_found(uri: Uri) -> Problem {
    Problem::new(
        StatusCode::NOT_FOUND,
        "Not Found",
        "No resource is served at this path",
    )
    .with_instance(uri.path())
}

/// `{"_links": {"self": {"href": ...}, "<id>": {"href": ...}}}`
fn discovery_links(resolver: &EndpointResolver) -> Value {
    let mut links = Map::new();
    links.insert("self".to_owned(), json!({ "href": resolver.prefix() }));
    for (id, path) in resolver.endpoints() {
        links.insert(id.to_owned(), json!({ "href": path }));
    }
    json!({ "_links": links })
}
