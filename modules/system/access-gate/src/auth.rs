use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use authn_resolver_sdk::{AuthNResolverClient, AuthNResolverError, BasicCredentials};
use gate_security::SecurityContext;

use crate::endpoints::EndpointResolver;
use crate::policy::{AccessPolicy, Decision};
use crate::problem::Problem;

/// Why an `Authorization` header could not be turned into basic credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header does not use the Basic scheme")]
    UnsupportedScheme,
    #[error("Basic credentials are not valid base64-encoded UTF-8")]
    InvalidEncoding,
    #[error("Basic credentials lack the ':' separator")]
    MissingSeparator,
    #[error("Basic credentials have an empty username")]
    EmptyUsername,
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub authn_client: Arc<dyn AuthNResolverClient>,
    pub policy: Arc<AccessPolicy>,
    pub resolver: Arc<EndpointResolver>,
    /// Prebuilt `WWW-Authenticate` value, e.g. `Basic realm="Realm"`.
    pub challenge: HeaderValue,
}

/// Build the `WWW-Authenticate` challenge for a realm.
///
/// Returns `None` if the realm contains a quote, a backslash or a character that
/// is not allowed in a header value.
#[must_use]
pub fn basic_challenge(realm: &str) -> Option<HeaderValue> {
    if realm.contains(['"', '\\']) {
        return None;
    }
    HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")).ok()
}

/// Access gate middleware.
///
/// For each request:
/// 1. Resolves the path into an endpoint descriptor and evaluates the access policy
/// 2. `ALLOW`: inserts an anonymous `SecurityContext` and forwards, credentials are not inspected
/// 3. `REQUIRE_AUTH`: decodes basic credentials, verifies them with the `AuthN` resolver and
///    inserts the principal's `SecurityContext`, or answers `401` with a basic challenge
pub async fn authn_middleware(
    axum::extract::State(state): axum::extract::State<AuthState>,
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let descriptor = state.resolver.resolve(req.uri().path());
    let evaluation = state.policy.evaluate(&descriptor);

    tracing::debug!(
        path = descriptor.path(),
        endpoint = descriptor.endpoint().unwrap_or("-"),
        decision = %evaluation.decision,
        rule = ?evaluation.rule_index,
        "Access policy evaluated"
    );

    match evaluation.decision {
        Decision::Allow => {
            req.extensions_mut().insert(SecurityContext::anonymous());
            next.run(req).await
        }
        Decision::RequireAuth => {
            let credentials = match extract_basic_credentials(req.headers()) {
                Ok(credentials) => credentials,
                Err(err) => {
                    tracing::debug!(path = descriptor.path(), "Basic credentials rejected: {err}");
                    return challenge_response(&state.challenge, &err.to_string(), descriptor.path());
                }
            };

            match state.authn_client.authenticate(&credentials).await {
                Ok(result) => {
                    tracing::debug!(
                        subject = result.security_context.subject().unwrap_or("-"),
                        path = descriptor.path(),
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(result.security_context);
                    next.run(req).await
                }
                Err(err) => authn_error_to_response(&err, &state.challenge, descriptor.path()),
            }
        }
    }
}

/// Decode `Authorization: Basic <base64(username:password)>`.
///
/// The scheme name is case-insensitive. The password is everything after the
/// first `:` and may itself contain colons.
///
/// # Errors
/// Returns a [`CredentialsError`] describing the first problem found.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, CredentialsError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(CredentialsError::Missing)?
        .to_str()
        .map_err(|_| CredentialsError::InvalidEncoding)?;

    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or(CredentialsError::UnsupportedScheme)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(CredentialsError::UnsupportedScheme);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CredentialsError::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| CredentialsError::InvalidEncoding)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(CredentialsError::MissingSeparator)?;
    if username.is_empty() {
        return Err(CredentialsError::EmptyUsername);
    }

    Ok(BasicCredentials::new(username, password))
}

/// `401` problem response carrying the basic challenge.
fn challenge_response(challenge: &HeaderValue, detail: &str, path: &str) -> Response {
    let mut response = Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail)
        .with_instance(path)
        .into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, challenge.clone());
    response
}

/// Convert `AuthNResolverError` to an RFC-9457 Problem Details response.
fn authn_error_to_response(
    err: &AuthNResolverError,
    challenge: &HeaderValue,
    path: &str,
) -> Response {
    log_authn_error(err);
    match err {
        AuthNResolverError::Unauthorized(_) => {
            challenge_response(challenge, "Authentication failed", path)
        }
        AuthNResolverError::ServiceUnavailable(_) => Problem::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable",
            "Authentication service unavailable",
        )
        .with_instance(path)
        .into_response(),
        AuthNResolverError::Internal(_) => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "Internal authentication error",
        )
        .with_instance(path)
        .into_response(),
    }
}

/// Log authentication errors at appropriate levels.
///
/// Cognitive complexity is inflated by tracing macro expansion.
#[allow(clippy::cognitive_complexity)]
fn log_authn_error(err: &AuthNResolverError) {
    match err {
        AuthNResolverError::Unauthorized(msg) => tracing::debug!("AuthN rejected: {msg}"),
        AuthNResolverError::ServiceUnavailable(msg) => {
            tracing::error!("AuthN service unavailable: {msg}");
        }
        AuthNResolverError::Internal(msg) => tracing::error!("AuthN internal error: {msg}"),
    }
}
