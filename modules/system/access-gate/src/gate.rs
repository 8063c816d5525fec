//! Access gate assembly: builds the policy and endpoint resolver once and layers
//! the gate onto an `axum` router.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::from_fn_with_state;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use authn_resolver_sdk::AuthNResolverClient;

use crate::auth::{self, AuthState};
use crate::config::GateConfig;
use crate::endpoints::{EndpointConfigError, EndpointResolver};
use crate::policy::{AccessPolicy, EndpointDescriptor, Evaluation, PolicyError};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("invalid access policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("invalid management endpoint configuration: {0}")]
    Endpoints(#[from] EndpointConfigError),

    #[error(
        "csrf_protection is not supported: the gate serves non-browser clients using basic auth; \
         put a CSRF-aware layer in front before exposing it to browsers"
    )]
    CsrfUnsupported,

    #[error("realm '{0}' cannot be used in a WWW-Authenticate header")]
    InvalidRealm(String),
}

/// Management access gate.
///
/// Holds the immutable access policy and endpoint resolver built at startup and the
/// credential verifier consulted for `REQUIRE_AUTH` decisions.
#[derive(Clone)]
pub struct AccessGate {
    config: GateConfig,
    policy: Arc<AccessPolicy>,
    resolver: Arc<EndpointResolver>,
    authn_client: Arc<dyn AuthNResolverClient>,
    challenge: HeaderValue,
}

impl AccessGate {
    /// Validate the configuration and build the gate.
    ///
    /// # Errors
    /// Returns [`GateError`] if the policy or the endpoint layout is invalid, the realm
    /// cannot be put in a header, or CSRF protection is requested.
    pub fn new(
        config: GateConfig,
        authn_client: Arc<dyn AuthNResolverClient>,
    ) -> Result<Self, GateError> {
        if config.csrf_protection {
            return Err(GateError::CsrfUnsupported);
        }
        let challenge = auth::basic_challenge(&config.realm)
            .ok_or_else(|| GateError::InvalidRealm(config.realm.clone()))?;

        let policy = AccessPolicy::from_config(&config.policy)?;
        let resolver = EndpointResolver::from_config(&config.management)?;

        tracing::info!(
            realm = %config.realm,
            base_path = %config.management.base_path,
            public_endpoints = ?config.policy.public_endpoints,
            exposed_endpoints = ?config.management.exposed,
            rules = policy.rules().len(),
            "Access gate built"
        );
        tracing::info!("CSRF protection disabled: gate expects non-browser basic-auth clients");

        Ok(Self {
            config,
            policy: Arc::new(policy),
            resolver: Arc::new(resolver),
            authn_client,
            challenge,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    #[must_use]
    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Resolve and evaluate a path the same way the middleware does.
    #[must_use]
    pub fn evaluate_path(&self, path: &str) -> (EndpointDescriptor, Evaluation) {
        let descriptor = self.resolver.resolve(path);
        let evaluation = self.policy.evaluate(&descriptor);
        (descriptor, evaluation)
    }

    /// Apply the gate and its supporting layers to a router.
    ///
    /// Routes and the fallback must be registered before calling this.
    #[must_use]
    pub fn apply(&self, mut router: Router) -> Router {
        // `Router::layer` wraps: the last layer added runs first on the request path.
        // Request order (outermost -> innermost): SetRequestId -> PropagateRequestId -> Trace -> Auth -> Router

        // 3) Auth
        let auth_state = AuthState {
            authn_client: Arc::clone(&self.authn_client),
            policy: Arc::clone(&self.policy),
            resolver: Arc::clone(&self.resolver),
            challenge: self.challenge.clone(),
        };
        router = router.layer(from_fn_with_state(auth_state, auth::authn_middleware));

        // 2) Trace
        router = router.layer({
            use tower_http::trace::TraceLayer;
            use tracing::field::Empty;

            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                    let rid = req
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");

                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        version = ?req.version(),
                        module = "access_gate",
                        request_id = %rid,
                        status = Empty,
                        latency_ms = Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record("latency_ms", latency.as_millis());
                    },
                )
        });

        // 1) Request ID: generate if missing, echo on the response
        let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

        router
    }
}
